//! # sitelens-core
//!
//! Core library for the static page-generation and SEO pipeline of a
//! service-area business site.
//!
//! This library provides:
//! - Catalog building from services × locations and blog posts
//! - Title, meta description, H1, canonical, Open Graph and Twitter tags
//! - JSON-LD `LocalBusiness` and `Service` blocks
//! - Bounded related-service links between pages
//! - Body content, sitemap and robots.txt generation and checks
//! - Per-page health scoring and a catalog-wide report
//!
//! ## Example
//!
//! ```
//! use sitelens_core::{
//!     BlogRegistry, CatalogBuilder, LocationSpec, SeoConfig, SeoIntegrationService,
//!     ServiceSpec, SitemapGenerator,
//! };
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = SeoConfig::default();
//! let catalog = CatalogBuilder::new()
//!     .services([ServiceSpec { name: "PU Polish".into(), ..Default::default() }])
//!     .locations([LocationSpec { name: "Bandra".into(), ..Default::default() }])
//!     .build(&BlogRegistry::new())?;
//!
//! let pages = SeoIntegrationService::new(&config).process_pages(catalog.records());
//! let sitemap = SitemapGenerator::new(&config).generate_xml_sitemap(&pages);
//! assert!(sitemap.contains("/pu-polish-in-bandra</loc>"));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod catalog;
pub mod config;
pub mod content;
pub mod error;
pub mod integration;
pub mod links;
pub mod meta;
pub mod monitor;
pub mod performance;
pub mod schema;
pub mod sitemap;
pub mod text;
pub mod types;
pub mod url_utils;

// Re-export commonly used types
pub use catalog::{
    BlogPostSpec, BlogRegistry, Catalog, CatalogBuilder, CatalogIssue, ContentLoader, FileLoader,
    LocationSpec, ServiceSpec, StaticPageSpec,
};
pub use config::SeoConfig;
pub use content::{ContentReport, ContentValidator};
pub use error::{CatalogError, ConfigError, Result, SeoError};
pub use integration::{PipelineReport, SeoIntegrationService};
pub use links::LinkManager;
pub use meta::MetaManager;
pub use monitor::{PageHealth, SeoMonitor, SeoReport};
pub use performance::PerformanceOptimizer;
pub use schema::SchemaBuilder;
pub use sitemap::{SitemapGenerator, SitemapValidation};
pub use types::{
    BulkUpdateResult, ChangeFreq, PageAnalysis, PageKind, PageRecord, RelatedService, SeoIssue,
    SeoPage, Severity, SitemapEntry,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_defaults() {
        let record = PageRecord::new("/pu-polish-in-bandra", "PU Polish", "Bandra");

        assert_eq!(record.kind(), PageKind::ServiceLocation);
        assert_eq!(record.target_keywords(), vec!["PU Polish"]);
        assert!(record.related_services.is_empty());
    }

    #[test]
    fn test_record_json_shape() {
        let json = r#"{
            "url": "/blog/teak-care",
            "title": "Caring for Teak Furniture",
            "lastModified": "2025-03-01",
            "relatedServices": [{"name": "PU Polish", "url": "/pu-polish"}]
        }"#;

        let record: PageRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.kind(), PageKind::Blog);
        assert_eq!(record.related_services[0].url, "/pu-polish");

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["lastModified"], "2025-03-01");
        assert!(value.get("kind").is_none());
        assert!(value["metaDescription"].is_string());
    }

    #[test]
    fn test_seo_page_rejects_bad_urls() {
        for url in ["", "pu-polish", "ftp://example.com/x", "/with space"] {
            let err = SeoPage::try_from(PageRecord::new(url, "", "")).unwrap_err();
            assert!(matches!(err, SeoError::InvalidPageUrl(_)), "{url}");
        }

        let page =
            SeoPage::try_from(PageRecord::new("https://example.com/pu-polish", "", "")).unwrap();
        assert_eq!(page.path, "/pu-polish");
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
        assert_eq!(Severity::Critical.deduction(), 20);
    }
}
