//! File handling behind the `sitelens` binary
//!
//! Kept out of `main.rs` so it can be tested without spawning the CLI.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use sitelens_core::{
    BlogPostSpec, BlogRegistry, Catalog, CatalogBuilder, LocationSpec, PageRecord, PipelineReport,
    SeoConfig, SeoIntegrationService, SeoMonitor, SeoReport, ServiceSpec, SitemapGenerator,
    StaticPageSpec,
};
use std::fs;
use std::path::{Path, PathBuf};

pub const PAGES_FILE: &str = "pages.json";
pub const REPORT_FILE: &str = "seo-report.json";
pub const PIPELINE_FILE: &str = "pipeline-report.json";

/// Catalog source file: `[[services]]`, `[[locations]]`, `[[posts]]`, `[[pages]]`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CatalogSource {
    /// Directory holding `{slug}.html` for each post, relative to the source file
    pub blog_dir: Option<PathBuf>,
    pub services: Vec<ServiceSpec>,
    pub locations: Vec<LocationSpec>,
    pub posts: Vec<BlogPostSpec>,
    pub pages: Vec<StaticPageSpec>,
}

impl CatalogSource {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog source {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse catalog source {}", path.display()))
    }
}

/// Load and validate the configuration, or use defaults when no file is given
pub fn load_config(path: Option<&Path>) -> Result<SeoConfig> {
    match path {
        Some(path) => Ok(SeoConfig::from_path(path)?),
        None => {
            let config = SeoConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}

/// Build the catalog described by `source_path`.
///
/// Premium services and locations are added to the sitemap premium terms.
pub fn load_catalog(source_path: &Path, config: &mut SeoConfig) -> Result<Catalog> {
    let source = CatalogSource::from_path(source_path)?;

    let registry = match &source.blog_dir {
        Some(dir) => {
            let base = source_path.parent().unwrap_or_else(|| Path::new("."));
            BlogRegistry::from_dir(&base.join(dir))?
        }
        None if source.posts.is_empty() => BlogRegistry::new(),
        None => bail!(
            "{} lists {} posts but no blog_dir",
            source_path.display(),
            source.posts.len()
        ),
    };

    let builder = CatalogBuilder::new()
        .services(source.services)
        .locations(source.locations)
        .posts(source.posts)
        .static_pages(source.pages);

    for keyword in builder.premium_keywords() {
        let known = config
            .sitemap
            .premium_keywords
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(&keyword));
        if !known {
            config.sitemap.premium_keywords.push(keyword);
        }
    }

    let catalog = builder
        .build(&registry)
        .with_context(|| format!("Failed to build catalog from {}", source_path.display()))?;
    Ok(catalog)
}

pub fn load_pages(path: &Path) -> Result<Vec<PageRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read pages file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse pages file {}", path.display()))
}

/// Everything one run produces
pub struct RunOutput {
    pub pages: Vec<PageRecord>,
    pub pipeline: PipelineReport,
    pub report: SeoReport,
}

pub fn run_pipeline(config: &SeoConfig, records: &[PageRecord]) -> RunOutput {
    let (pages, pipeline) =
        SeoIntegrationService::new(config).process_pages_with_report(records);
    let report = SeoMonitor::new(config).generate_seo_report(&pages);
    RunOutput {
        pages,
        pipeline,
        report,
    }
}

pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    fs::write(path, json + "\n").with_context(|| format!("Failed to write {}", path.display()))
}

/// Write pages.json, sitemap.xml, robots.txt, seo-report.json and
/// pipeline-report.json into `out_dir`
pub fn write_outputs(config: &SeoConfig, output: &RunOutput, out_dir: &Path) -> Result<()> {
    SitemapGenerator::new(config).write_files(&output.pages, out_dir)?;
    write_json(&out_dir.join(PAGES_FILE), &output.pages)?;
    write_json(&out_dir.join(REPORT_FILE), &output.report)?;
    write_json(&out_dir.join(PIPELINE_FILE), &output.pipeline)?;
    log::info!("wrote outputs to {}", out_dir.display());
    Ok(())
}
