//! Image loading hints

use crate::types::{BulkUpdateResult, PerformanceHints, SeoPage};
use scraper::{Html, Selector};
use std::collections::BTreeMap;

const WEBP_SOURCE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png"];

#[derive(Debug, Default)]
pub struct PerformanceOptimizer;

impl PerformanceOptimizer {
    pub fn new() -> Self {
        Self
    }

    /// Derive preload, lazy-load and WebP hints from the page's `<img>` tags.
    ///
    /// Only `page.performance` is written; record fields are left alone.
    pub fn optimize_page(&self, page: &mut SeoPage) {
        let sources = page
            .record
            .content
            .as_deref()
            .map(image_sources)
            .unwrap_or_default();

        let mut hints = PerformanceHints::default();
        let mut sources = sources.into_iter();
        hints.preload = sources.next();
        hints.lazy_load = sources.collect();

        hints.webp_alternatives = hints
            .preload
            .iter()
            .chain(hints.lazy_load.iter())
            .filter_map(|src| webp_variant(src).map(|webp| (src.clone(), webp)))
            .collect::<BTreeMap<_, _>>();

        page.performance = hints;
    }

    pub fn optimize_pages(&self, pages: &mut [SeoPage]) -> BulkUpdateResult {
        let mut result = BulkUpdateResult::default();
        for page in pages.iter_mut() {
            self.optimize_page(page);
            result.record_success(page.url());
        }
        log::info!("performance stage: {} pages", result.successful_pages.len());
        result
    }
}

/// Distinct `<img src>` values in document order
fn image_sources(html: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse("img[src]") else {
        return Vec::new();
    };
    let fragment = Html::parse_fragment(html);

    let mut sources: Vec<String> = Vec::new();
    for image in fragment.select(&selector) {
        let Some(src) = image.value().attr("src").map(str::trim) else {
            continue;
        };
        if !src.is_empty() && !sources.iter().any(|seen| seen == src) {
            sources.push(src.to_string());
        }
    }
    sources
}

/// `.webp` sibling for raster formats, keeping any query string
fn webp_variant(src: &str) -> Option<String> {
    let (path, query) = match src.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (src, None),
    };
    let lower = path.to_ascii_lowercase();
    let extension = WEBP_SOURCE_EXTENSIONS
        .iter()
        .find(|extension| lower.ends_with(*extension))?;

    let stem = &path[..path.len() - extension.len()];
    Some(match query {
        Some(query) => format!("{stem}.webp?{query}"),
        None => format!("{stem}.webp"),
    })
}
