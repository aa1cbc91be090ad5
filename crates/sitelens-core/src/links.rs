//! Related-service link selection
//!
//! Each page gets between `min_outgoing_links` and `max_outgoing_links`
//! links to other catalog pages. Pages sharing the source's service or
//! location rank first; unrelated pages are only used to reach the minimum.
//! Within a rank, candidates are taken in catalog order starting just after
//! the source page, so neighbouring pages draw different sets.

use crate::config::SeoConfig;
use crate::types::{BulkUpdateResult, LinkType, OutgoingLink, PageKind, RelatedService, SeoPage};
use crate::url_utils::{normalize_origin, page_path};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Links chosen for one page
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSelection {
    pub links: Vec<RelatedService>,
    /// How many links short of the minimum the selection is
    pub shortfall: usize,
}

/// Something wrong with a page's current related-service block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkProblem {
    TooFew { count: usize, min: usize },
    TooMany { count: usize, max: usize },
    SelfLink(String),
    Duplicate(String),
    /// Target url is not in the catalog
    Dangling(String),
}

impl std::fmt::Display for LinkProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkProblem::TooFew { count, min } => {
                write!(f, "{count} related links, minimum is {min}")
            }
            LinkProblem::TooMany { count, max } => {
                write!(f, "{count} related links, maximum is {max}")
            }
            LinkProblem::SelfLink(url) => write!(f, "related link points at the page itself: {url}"),
            LinkProblem::Duplicate(url) => write!(f, "duplicate related link: {url}"),
            LinkProblem::Dangling(url) => write!(f, "related link target not in catalog: {url}"),
        }
    }
}

pub struct LinkManager<'a> {
    config: &'a SeoConfig,
}

impl<'a> LinkManager<'a> {
    pub fn new(config: &'a SeoConfig) -> Self {
        Self { config }
    }

    /// Pages that may appear in another page's related-services block
    fn is_link_target(page: &SeoPage) -> bool {
        matches!(
            page.kind(),
            PageKind::Category | PageKind::ServiceLocation | PageKind::Blog
        )
    }

    fn relevance(source: &SeoPage, candidate: &SeoPage) -> u8 {
        let same = |a: &str, b: &str| {
            let a = a.trim();
            !a.is_empty() && a.eq_ignore_ascii_case(b.trim())
        };
        let mut score = 0;
        if same(&source.record.service_name, &candidate.record.service_name) {
            score += 1;
        }
        if same(&source.record.location, &candidate.record.location) {
            score += 1;
        }
        score
    }

    /// Choose the related services for `page` out of `catalog`
    pub fn select_related_services(&self, page: &SeoPage, catalog: &[SeoPage]) -> LinkSelection {
        let min = self.config.links.min_outgoing_links;
        let max = self.config.links.max_outgoing_links;

        let targets: HashSet<&str> = catalog
            .iter()
            .filter(|candidate| Self::is_link_target(candidate))
            .map(|candidate| candidate.path.as_str())
            .collect();

        let mut seen: HashSet<String> = HashSet::from([page.path.clone()]);
        let mut links: Vec<RelatedService> = Vec::new();

        for link in &page.record.related_services {
            let Some(path) = page_path(&link.url) else {
                continue;
            };
            if links.len() < max && targets.contains(path.as_str()) && seen.insert(path) {
                links.push(link.clone());
            }
        }

        let untouched = links.len() == page.record.related_services.len();
        if untouched && links.len() >= min {
            return LinkSelection {
                links,
                shortfall: 0,
            };
        }

        let len = catalog.len().max(1);
        let source_index = catalog
            .iter()
            .position(|candidate| candidate.path == page.path)
            .unwrap_or(0);

        let mut ranked: Vec<(u8, usize, &SeoPage)> = catalog
            .iter()
            .enumerate()
            .filter(|(_, candidate)| Self::is_link_target(candidate))
            .map(|(index, candidate)| {
                let distance = (index + len - source_index) % len;
                (Self::relevance(page, candidate), distance, candidate)
            })
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        for (relevance, _, candidate) in ranked {
            if links.len() >= max || (relevance == 0 && links.len() >= min) {
                break;
            }
            if seen.insert(candidate.path.clone()) {
                links.push(RelatedService {
                    name: candidate.record.link_name(),
                    url: candidate.record.url.clone(),
                });
            }
        }

        let shortfall = min.saturating_sub(links.len());
        LinkSelection { links, shortfall }
    }

    /// Check a page's current related-service block against the catalog
    pub fn validate_links(&self, page: &SeoPage, catalog_paths: &HashSet<String>) -> Vec<LinkProblem> {
        let min = self.config.links.min_outgoing_links;
        let max = self.config.links.max_outgoing_links;
        let count = page.record.related_services.len();
        let mut problems = Vec::new();

        if count < min {
            problems.push(LinkProblem::TooFew { count, min });
        }
        if count > max {
            problems.push(LinkProblem::TooMany { count, max });
        }

        let mut seen = HashSet::new();
        for link in &page.record.related_services {
            let path = page_path(&link.url).unwrap_or_else(|| link.url.clone());
            if path == page.path {
                problems.push(LinkProblem::SelfLink(link.url.clone()));
            } else if !catalog_paths.contains(&path) {
                problems.push(LinkProblem::Dangling(link.url.clone()));
            }
            if !seen.insert(path) {
                problems.push(LinkProblem::Duplicate(link.url.clone()));
            }
        }

        problems
    }

    /// Select related services for every page in the batch.
    ///
    /// A page whose pool cannot reach the minimum keeps what could be
    /// assembled and is reported as failed; the rest of the batch continues.
    pub fn process_link_updates(&self, pages: &mut [SeoPage]) -> BulkUpdateResult {
        let mut result = BulkUpdateResult::default();
        let min = self.config.links.min_outgoing_links;

        let selections: Vec<LinkSelection> = pages
            .iter()
            .map(|page| self.select_related_services(page, pages))
            .collect();

        for (page, selection) in pages.iter_mut().zip(selections) {
            page.record.related_services = selection.links;
            page.outgoing_links = self.outgoing_links(page);

            if selection.shortfall > 0 {
                let message = format!(
                    "insufficient link pool: {} related links available, minimum is {}",
                    page.record.related_services.len(),
                    min
                );
                log::warn!("{}: {}", page.url(), message);
                result.record_failure(page.url(), vec![message]);
            } else {
                result.record_success(page.url());
            }
        }

        log::info!(
            "link stage: {} pages linked, {} short of minimum",
            result.successful_pages.len(),
            result.failed_pages.len()
        );
        result
    }

    /// Related-service links plus the `<a href>` links in the body
    fn outgoing_links(&self, page: &SeoPage) -> Vec<OutgoingLink> {
        let mut links: Vec<OutgoingLink> = page
            .record
            .related_services
            .iter()
            .map(|related| OutgoingLink {
                source_url: page.record.url.clone(),
                target_url: related.url.clone(),
                anchor_text: related.name.clone(),
                link_type: LinkType::Related,
                is_no_follow: false,
                context: "related-services".to_string(),
            })
            .collect();

        if let Some(content) = &page.record.content {
            links.extend(self.content_links(&page.record.url, content));
        }
        links
    }

    fn content_links(&self, source_url: &str, html: &str) -> Vec<OutgoingLink> {
        let Ok(selector) = Selector::parse("a[href]") else {
            return Vec::new();
        };
        let site_origin = normalize_origin(&self.config.site.url);
        let fragment = Html::parse_fragment(html);

        fragment
            .select(&selector)
            .filter_map(|anchor| {
                let href = anchor.value().attr("href")?.trim();
                if href.is_empty()
                    || href.starts_with('#')
                    || href.starts_with("mailto:")
                    || href.starts_with("tel:")
                {
                    return None;
                }

                let rel = anchor.value().attr("rel").unwrap_or_default();
                let (target_url, link_type) = match Url::parse(href) {
                    Ok(parsed) if normalize_origin(parsed.as_str()) != site_origin => {
                        (href.to_string(), LinkType::External)
                    }
                    Ok(parsed) => (parsed.path().to_string(), LinkType::Contextual),
                    Err(_) => (href.to_string(), LinkType::Contextual),
                };

                Some(OutgoingLink {
                    source_url: source_url.to_string(),
                    target_url,
                    anchor_text: anchor.text().collect::<String>().trim().to_string(),
                    link_type,
                    is_no_follow: rel.split_whitespace().any(|token| token == "nofollow"),
                    context: "content".to_string(),
                })
            })
            .collect()
    }
}
