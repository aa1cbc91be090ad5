//! Page catalog
//!
//! The catalog is the ordered list of every generated route. It is built once
//! from services, locations and blog posts, passed explicitly to each stage,
//! and rebuilt wholesale rather than edited in place.

use crate::error::CatalogError;
use crate::types::{PageKind, PageRecord, Severity};
use crate::url_utils::{page_path, slugify};
use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

const BLOG_INDEX_TITLE: &str = "Furniture Care Tips and Guides";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogIssueKind {
    DuplicateUrl,
    /// Related link to a url that is not in the catalog
    DanglingLink,
    SelfLink,
}

/// A cross-page consistency problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogIssue {
    pub kind: CatalogIssueKind,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub message: String,
}

impl CatalogIssue {
    pub fn severity(&self) -> Severity {
        match self.kind {
            CatalogIssueKind::DuplicateUrl => Severity::Critical,
            CatalogIssueKind::DanglingLink | CatalogIssueKind::SelfLink => Severity::Warning,
        }
    }
}

/// Owned, ordered collection of page records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    records: Vec<PageRecord>,
}

impl Catalog {
    /// Duplicates are accepted here and reported by [`Catalog::integrity_issues`]
    pub fn new(records: Vec<PageRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[PageRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<PageRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, url: &str) -> Option<&PageRecord> {
        let path = page_path(url)?;
        self.records
            .iter()
            .find(|record| page_path(&record.url).as_deref() == Some(path.as_str()))
    }

    pub fn integrity_issues(&self) -> Vec<CatalogIssue> {
        integrity_issues(&self.records)
    }
}

/// Duplicate urls, dangling related links and self links across `records`
pub fn integrity_issues(records: &[PageRecord]) -> Vec<CatalogIssue> {
    let mut issues = Vec::new();
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        let path = page_path(&record.url).unwrap_or_else(|| record.url.clone());
        *counts.entry(path).or_insert(0) += 1;
    }

    for (path, count) in &counts {
        if *count > 1 {
            issues.push(CatalogIssue {
                kind: CatalogIssueKind::DuplicateUrl,
                url: path.clone(),
                target: None,
                message: format!("url {path} appears {count} times in the catalog"),
            });
        }
    }

    for record in records {
        let source = page_path(&record.url).unwrap_or_else(|| record.url.clone());
        for link in &record.related_services {
            let target = page_path(&link.url).unwrap_or_else(|| link.url.clone());
            if target == source {
                issues.push(CatalogIssue {
                    kind: CatalogIssueKind::SelfLink,
                    url: record.url.clone(),
                    target: Some(link.url.clone()),
                    message: format!("{} links to itself", record.url),
                });
            } else if !counts.contains_key(&target) {
                issues.push(CatalogIssue {
                    kind: CatalogIssueKind::DanglingLink,
                    url: record.url.clone(),
                    target: Some(link.url.clone()),
                    message: format!("{} links to {} which is not in the catalog", record.url, link.url),
                });
            }
        }
    }

    issues
}

/// Produces the body HTML of a blog post
pub trait ContentLoader {
    fn load(&self, slug: &str) -> anyhow::Result<String>;
}

impl<F> ContentLoader for F
where
    F: Fn(&str) -> anyhow::Result<String>,
{
    fn load(&self, slug: &str) -> anyhow::Result<String> {
        self(slug)
    }
}

/// Reads `{dir}/{slug}.html`
#[derive(Debug, Clone)]
pub struct FileLoader {
    dir: PathBuf,
}

impl FileLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ContentLoader for FileLoader {
    fn load(&self, slug: &str) -> anyhow::Result<String> {
        let path = self.dir.join(format!("{slug}.html"));
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read blog post {}", path.display()))
    }
}

/// Explicit slug → loader map; every blog post must be registered
#[derive(Default)]
pub struct BlogRegistry {
    loaders: BTreeMap<String, Box<dyn ContentLoader>>,
}

impl BlogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a [`FileLoader`] for every `*.html` file in `dir`
    pub fn from_dir(dir: &Path) -> anyhow::Result<Self> {
        let mut registry = Self::new();
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read blog directory {}", dir.display()))?;

        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("html") {
                continue;
            }
            if let Some(slug) = path.file_stem().and_then(|stem| stem.to_str()) {
                registry.register(slug, FileLoader::new(dir));
            }
        }

        log::debug!("registered {} blog posts from {}", registry.len(), dir.display());
        Ok(registry)
    }

    pub fn register(&mut self, slug: impl Into<String>, loader: impl ContentLoader + 'static) {
        self.loaders.insert(slug.into(), Box::new(loader));
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.loaders.contains_key(slug)
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    pub fn load(&self, slug: &str) -> Result<String, CatalogError> {
        let loader = self
            .loaders
            .get(slug)
            .ok_or_else(|| CatalogError::UnknownBlogSlug(slug.to_string()))?;
        loader
            .load(slug)
            .map_err(|source| CatalogError::LoaderFailed {
                slug: slug.to_string(),
                source,
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,
    /// Defaults to the slugified name
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub premium: bool,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationSpec {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub premium: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlogPostSpec {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub published: Option<NaiveDate>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Informational page such as `/about`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticPageSpec {
    pub slug: String,
    pub title: String,
}

/// Expands services × locations and blog posts into a [`Catalog`]
#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    services: Vec<ServiceSpec>,
    locations: Vec<LocationSpec>,
    posts: Vec<BlogPostSpec>,
    static_pages: Vec<StaticPageSpec>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn services(mut self, services: impl IntoIterator<Item = ServiceSpec>) -> Self {
        self.services.extend(services);
        self
    }

    pub fn locations(mut self, locations: impl IntoIterator<Item = LocationSpec>) -> Self {
        self.locations.extend(locations);
        self
    }

    pub fn posts(mut self, posts: impl IntoIterator<Item = BlogPostSpec>) -> Self {
        self.posts.extend(posts);
        self
    }

    pub fn static_pages(mut self, pages: impl IntoIterator<Item = StaticPageSpec>) -> Self {
        self.static_pages.extend(pages);
        self
    }

    /// Names of services and locations flagged premium, for sitemap priority
    pub fn premium_keywords(&self) -> Vec<String> {
        self.services
            .iter()
            .filter(|service| service.premium)
            .map(|service| service.name.clone())
            .chain(
                self.locations
                    .iter()
                    .filter(|location| location.premium)
                    .map(|location| location.name.clone()),
            )
            .collect()
    }

    pub fn build(&self, registry: &BlogRegistry) -> Result<Catalog, CatalogError> {
        let mut records = Vec::new();

        let mut home = PageRecord::new("/", "", "");
        home.kind = Some(PageKind::Home);
        home.keywords = self.services.iter().map(|s| s.name.clone()).collect();
        records.push(home);

        let mut service_slugs = Vec::with_capacity(self.services.len());
        for service in &self.services {
            let slug = entry_slug("service", &service.name, service.slug.as_deref())?;
            let mut record = PageRecord::new(format!("/{slug}"), service.name.trim(), "");
            record.kind = Some(PageKind::Category);
            record.keywords = service.keywords.clone();
            record.image = service.image.clone();
            records.push(record);
            service_slugs.push(slug);
        }

        let mut location_slugs = Vec::with_capacity(self.locations.len());
        for location in &self.locations {
            location_slugs.push(entry_slug("location", &location.name, location.slug.as_deref())?);
        }

        for (service, service_slug) in self.services.iter().zip(&service_slugs) {
            for (location, location_slug) in self.locations.iter().zip(&location_slugs) {
                let mut record = PageRecord::new(
                    format!("/{service_slug}-in-{location_slug}"),
                    service.name.trim(),
                    location.name.trim(),
                );
                record.kind = Some(PageKind::ServiceLocation);
                record.keywords = service.keywords.clone();
                record.image = service.image.clone();
                records.push(record);
            }
        }

        if !self.posts.is_empty() {
            let mut index = PageRecord::new("/blog", "", "");
            index.kind = Some(PageKind::BlogIndex);
            index.title = BLOG_INDEX_TITLE.to_string();
            records.push(index);
        }

        for post in &self.posts {
            let slug = entry_slug("blog post", &post.title, Some(post.slug.as_str()))?;
            let mut record = PageRecord::new(
                format!("/blog/{slug}"),
                "",
                post.location.as_deref().unwrap_or_default().trim(),
            );
            record.kind = Some(PageKind::Blog);
            record.title = post.title.trim().to_string();
            record.keywords = post.keywords.clone();
            record.last_modified = post.published;
            record.image = post.image.clone();
            record.content = Some(registry.load(&slug)?);
            records.push(record);
        }

        for page in &self.static_pages {
            let slug = entry_slug("static page", &page.title, Some(page.slug.as_str()))?;
            let mut record = PageRecord::new(format!("/{slug}"), "", "");
            record.kind = Some(PageKind::Static);
            record.title = page.title.trim().to_string();
            records.push(record);
        }

        let mut seen = HashSet::new();
        for record in &records {
            if !seen.insert(record.url.as_str()) {
                return Err(CatalogError::DuplicateUrl(record.url.clone()));
            }
        }

        log::info!(
            "built catalog: {} pages ({} services × {} locations, {} posts)",
            records.len(),
            self.services.len(),
            self.locations.len(),
            self.posts.len()
        );
        Ok(Catalog::new(records))
    }
}

/// Explicit slug if given, else the slugified name; both must be non-empty
fn entry_slug(what: &str, name: &str, slug: Option<&str>) -> Result<String, CatalogError> {
    if name.trim().is_empty() {
        return Err(CatalogError::InvalidEntry(format!("{what} has an empty name")));
    }
    let slug = match slug {
        Some(slug) => slug.trim().trim_matches('/').to_string(),
        None => slugify(name),
    };
    if slug.is_empty() || slug.contains(char::is_whitespace) {
        return Err(CatalogError::InvalidEntry(format!(
            "{what} \"{name}\" has an invalid slug {slug:?}"
        )));
    }
    Ok(slug)
}
