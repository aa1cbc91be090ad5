//! sitemap.xml and robots.txt generation.
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://www.mumbaifurniturepolish.com/</loc>
//!     <lastmod>2025-01-01</lastmod>
//!     <changefreq>daily</changefreq>
//!     <priority>1.0</priority>
//!   </url>
//! </urlset>
//! ```

use crate::config::SeoConfig;
use crate::text::contains_phrase;
use crate::types::{ChangeFreq, PageKind, PageRecord, SitemapEntry};
use crate::url_utils::site_page_url;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use url::Url;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const MAX_URLS: usize = 50_000;

static URL_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<url>(.*?)</url>").expect("static url regex is valid"));
static URLSET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<urlset\b[^>]*\bxmlns\s*=\s*["']([^"']*)["']"#).expect("static urlset regex is valid")
});
static LOC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<loc>(.*?)</loc>").expect("static loc regex is valid"));
static LASTMOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<lastmod>(.*?)</lastmod>").expect("static lastmod regex is valid")
});
static CHANGEFREQ_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<changefreq>(.*?)</changefreq>").expect("static changefreq regex is valid")
});
static PRIORITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<priority>(.*?)</priority>").expect("static priority regex is valid")
});

/// Result of checking a sitemap document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapValidation {
    pub valid: bool,
    pub url_count: usize,
    pub errors: Vec<String>,
}

pub struct SitemapGenerator<'a> {
    config: &'a SeoConfig,
    /// `<lastmod>` values after this date are clamped to it
    today: NaiveDate,
}

impl<'a> SitemapGenerator<'a> {
    pub fn new(config: &'a SeoConfig) -> Self {
        Self::with_today(config, chrono::Local::now().date_naive())
    }

    pub fn with_today(config: &'a SeoConfig, today: NaiveDate) -> Self {
        Self { config, today }
    }

    fn is_premium(&self, value: &str) -> bool {
        !value.trim().is_empty()
            && self
                .config
                .sitemap
                .premium_keywords
                .iter()
                .any(|keyword| contains_phrase(value, keyword))
    }

    /// Priority and change frequency for one page
    pub fn policy(&self, record: &PageRecord) -> (f32, ChangeFreq) {
        match record.kind() {
            PageKind::Home => (1.0, ChangeFreq::Daily),
            PageKind::Category => (0.9, ChangeFreq::Weekly),
            PageKind::ServiceLocation => {
                let premium = [&record.service_name, &record.location]
                    .into_iter()
                    .filter(|value| self.is_premium(value))
                    .count();
                match premium {
                    2 => (0.8, ChangeFreq::Weekly),
                    1 => (0.7, ChangeFreq::Weekly),
                    _ => (0.6, ChangeFreq::Monthly),
                }
            }
            PageKind::BlogIndex => (0.8, ChangeFreq::Weekly),
            PageKind::Blog => (0.6, ChangeFreq::Monthly),
            PageKind::Static => (0.5, ChangeFreq::Yearly),
        }
    }

    /// One entry per distinct absolute url, in catalog order
    pub fn entries(&self, pages: &[PageRecord]) -> Vec<SitemapEntry> {
        let mut seen = HashSet::new();
        pages
            .iter()
            .filter_map(|record| {
                let url = site_page_url(&self.config.site.url, &record.url);
                if !seen.insert(url.clone()) {
                    log::debug!("sitemap: skipping duplicate url {url}");
                    return None;
                }
                let (priority, change_freq) = self.policy(record);
                Some(SitemapEntry {
                    url,
                    last_modified: record.last_modified.map(|date| date.min(self.today)),
                    priority,
                    change_freq,
                })
            })
            .collect()
    }

    pub fn generate_xml_sitemap(&self, pages: &[PageRecord]) -> String {
        let entries = self.entries(pages);
        let mut xml = String::with_capacity(128 + entries.len() * 160);

        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<urlset xmlns=\"");
        xml.push_str(SITEMAP_NS);
        xml.push_str("\">\n");

        for entry in entries {
            xml.push_str("  <url>\n    <loc>");
            xml.push_str(&escape_xml(&entry.url));
            xml.push_str("</loc>\n");
            if let Some(lastmod) = entry.last_modified {
                xml.push_str("    <lastmod>");
                xml.push_str(&lastmod.format("%Y-%m-%d").to_string());
                xml.push_str("</lastmod>\n");
            }
            xml.push_str("    <changefreq>");
            xml.push_str(entry.change_freq.as_str());
            xml.push_str("</changefreq>\n");
            xml.push_str(&format!("    <priority>{:.1}</priority>\n", entry.priority));
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }

    pub fn generate_robots_txt(&self, sitemap_url: &str) -> String {
        let mut robots = String::from("User-agent: *\nAllow: /\n");
        for path in &self.config.sitemap.disallow {
            robots.push_str("Disallow: ");
            robots.push_str(path);
            robots.push('\n');
        }
        robots.push('\n');
        robots.push_str("Sitemap: ");
        robots.push_str(sitemap_url);
        robots.push('\n');
        robots
    }

    pub fn validate_sitemap(&self, xml: &str) -> SitemapValidation {
        let mut errors: Vec<String> = Vec::new();

        if !xml.trim_start().starts_with("<?xml") {
            errors.push("missing XML declaration".to_string());
        }
        match URLSET_RE.captures(xml).and_then(|cap| cap.get(1)) {
            Some(ns) if ns.as_str() == SITEMAP_NS => {}
            Some(ns) => errors.push(format!("urlset has wrong namespace: {}", ns.as_str())),
            None => errors.push(format!("missing <urlset> root in the {SITEMAP_NS} namespace")),
        }

        let mut locs = HashSet::new();
        let mut url_count = 0;

        for (index, block) in URL_BLOCK_RE.captures_iter(xml).enumerate() {
            url_count += 1;
            let block = block.get(1).map(|m| m.as_str()).unwrap_or_default();

            let Some(loc) = tag_value(&LOC_RE, block).map(|loc| decode_xml_entities(&loc)) else {
                errors.push(format!("url entry {} has no <loc>", index + 1));
                continue;
            };

            if !is_absolute_https(&loc) {
                errors.push(format!("<loc> is not an absolute https url: {loc}"));
            }
            if !locs.insert(loc.clone()) {
                errors.push(format!("duplicate <loc>: {loc}"));
            }

            if let Some(lastmod) = tag_value(&LASTMOD_RE, block) {
                match parse_lastmod(&lastmod) {
                    Some(date) if date > self.today => {
                        errors.push(format!("<lastmod> {lastmod} is in the future for {loc}"));
                    }
                    Some(_) => {}
                    None => errors.push(format!("invalid <lastmod> {lastmod} for {loc}")),
                }
            }

            if let Some(priority) = tag_value(&PRIORITY_RE, block) {
                let in_range = priority
                    .parse::<f32>()
                    .is_ok_and(|value| (0.0..=1.0).contains(&value));
                if !in_range {
                    errors.push(format!("invalid <priority> {priority} for {loc}"));
                }
            }

            if let Some(change_freq) = tag_value(&CHANGEFREQ_RE, block)
                && ChangeFreq::from_str(&change_freq).is_err()
            {
                errors.push(format!("invalid <changefreq> {change_freq} for {loc}"));
            }
        }

        if url_count > MAX_URLS {
            errors.push(format!(
                "sitemap exceeds 50,000 URL limit ({url_count} URLs)"
            ));
        }

        let mut distinct = HashSet::new();
        errors.retain(|error| distinct.insert(error.clone()));

        SitemapValidation {
            valid: errors.is_empty(),
            url_count,
            errors,
        }
    }

    /// Write `sitemap.xml` and `robots.txt` into `dir`
    pub fn write_files(&self, pages: &[PageRecord], dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

        let sitemap_path = dir.join(&self.config.site.sitemap_path);
        let xml = self.generate_xml_sitemap(pages);
        fs::write(&sitemap_path, &xml)
            .with_context(|| format!("Failed to write sitemap to {}", sitemap_path.display()))?;

        let robots_path = dir.join("robots.txt");
        fs::write(&robots_path, self.generate_robots_txt(&self.config.sitemap_url()))
            .with_context(|| format!("Failed to write robots.txt to {}", robots_path.display()))?;

        log::info!(
            "wrote {} and {}",
            sitemap_path.display(),
            robots_path.display()
        );
        Ok(())
    }
}

fn tag_value(re: &Regex, block: &str) -> Option<String> {
    re.captures(block)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Accepts `YYYY-MM-DD` and W3C datetimes, judged by their date part
fn parse_lastmod(value: &str) -> Option<NaiveDate> {
    let date = value.get(..10)?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

fn is_absolute_https(input: &str) -> bool {
    matches!(Url::parse(input), Ok(parsed) if parsed.scheme() == "https" && parsed.has_host())
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    Cow::Owned(
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;"),
    )
}

fn decode_xml_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn record(url: &str, service: &str, location: &str) -> PageRecord {
        PageRecord::new(url, service, location)
    }

    fn catalog() -> Vec<PageRecord> {
        let mut post = record("/blog/teak-care", "", "");
        post.title = "Caring for Teak Furniture".into();
        post.last_modified = NaiveDate::from_ymd_opt(2025, 5, 20);
        vec![
            record("/", "", ""),
            record("/pu-polish", "PU Polish", ""),
            record("/pu-polish-in-bandra", "PU Polish", "Bandra"),
            record("/pu-polish-in-powai", "PU Polish", "Powai"),
            record("/duco-paint-in-powai", "Duco Paint", "Powai"),
            record("/blog", "", ""),
            post,
            record("/about", "", ""),
        ]
    }

    #[test]
    fn priorities_follow_page_kind_and_premium_terms() {
        let config = SeoConfig::default();
        let generator = SitemapGenerator::with_today(&config, today());
        let entries = generator.entries(&catalog());

        let policy: Vec<(f32, ChangeFreq)> =
            entries.iter().map(|e| (e.priority, e.change_freq)).collect();
        assert_eq!(
            policy,
            vec![
                (1.0, ChangeFreq::Daily),
                (0.9, ChangeFreq::Weekly),
                (0.8, ChangeFreq::Weekly),
                (0.7, ChangeFreq::Weekly),
                (0.6, ChangeFreq::Monthly),
                (0.8, ChangeFreq::Weekly),
                (0.6, ChangeFreq::Monthly),
                (0.5, ChangeFreq::Yearly),
            ]
        );
    }

    #[test]
    fn every_url_appears_once_and_output_validates() {
        let config = SeoConfig::default();
        let generator = SitemapGenerator::with_today(&config, today());
        let mut pages = catalog();
        pages.push(record("/pu-polish-in-bandra", "PU Polish", "Bandra"));

        let xml = generator.generate_xml_sitemap(&pages);

        for page in catalog() {
            let loc = format!("<loc>{}</loc>", site_page_url(&config.site.url, &page.url));
            assert_eq!(xml.matches(&loc).count(), 1, "{loc}");
        }
        assert!(xml.contains("<priority>1.0</priority>"));
        assert!(xml.contains("<lastmod>2025-05-20</lastmod>"));

        let validation = generator.validate_sitemap(&xml);
        assert!(validation.valid, "{:?}", validation.errors);
        assert_eq!(validation.url_count, 8);
    }

    #[test]
    fn locs_use_the_site_origin_and_match_canonicals() {
        let config = SeoConfig::default();
        let generator = SitemapGenerator::with_today(&config, today());
        let pages = vec![
            record("/pu-polish-in-bandra", "PU Polish", "Bandra"),
            record(
                "http://www.mumbaifurniturepolish.com/pu-polish-in-juhu",
                "PU Polish",
                "Juhu",
            ),
            record("https://other.example.com/pu-polish-in-powai", "PU Polish", "Powai"),
            record("https://other.example.com/pu-polish-in-bandra", "PU Polish", "Bandra"),
        ];

        let entries = generator.entries(&pages);
        let meta = crate::meta::MetaManager::new(&config);
        assert_eq!(entries.len(), 3);
        for (entry, page) in entries.iter().zip(&pages) {
            assert!(entry.url.starts_with("https://www.mumbaifurniturepolish.com/"));
            assert_eq!(entry.url, meta.generate_canonical_tag(page));
        }

        let xml = generator.generate_xml_sitemap(&pages);
        assert!(!xml.contains("<loc>http://"));
        assert!(!xml.contains("other.example.com"));
        assert!(generator.validate_sitemap(&xml).valid);
    }

    #[test]
    fn plain_http_loc_is_rejected() {
        let config = SeoConfig::default();
        let generator = SitemapGenerator::with_today(&config, today());
        let xml = format!(
            "<?xml version=\"1.0\"?>\n<urlset xmlns=\"{SITEMAP_NS}\"><url><loc>http://example.com/a</loc></url></urlset>"
        );

        let validation = generator.validate_sitemap(&xml);
        assert_eq!(validation.errors, vec!["<loc> is not an absolute https url: http://example.com/a"]);
    }

    #[test]
    fn future_lastmod_is_clamped() {
        let config = SeoConfig::default();
        let generator = SitemapGenerator::with_today(&config, today());
        let mut page = record("/pu-polish", "PU Polish", "");
        page.last_modified = NaiveDate::from_ymd_opt(2030, 1, 1);

        let entries = generator.entries(&[page]);
        assert_eq!(entries[0].last_modified, Some(today()));
    }

    #[test]
    fn locs_are_escaped() {
        let config = SeoConfig::default();
        let generator = SitemapGenerator::with_today(&config, today());
        let xml = generator.generate_xml_sitemap(&[record("/search?a=1&b=2", "", "")]);
        assert!(xml.contains("/search?a=1&amp;b=2</loc>"));
        assert!(generator.validate_sitemap(&xml).valid);
    }

    #[test]
    fn duplicate_loc_and_bad_priority_are_rejected() {
        let config = SeoConfig::default();
        let generator = SitemapGenerator::with_today(&config, today());
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/a</loc><priority>1.5</priority></url>
  <url><loc>https://example.com/a</loc><changefreq>sometimes</changefreq></url>
  <url><loc>/relative</loc><lastmod>2031-01-01</lastmod></url>
</urlset>"#;

        let validation = generator.validate_sitemap(xml);
        assert!(!validation.valid);
        assert!(validation.errors.iter().any(|e| e.contains("invalid <priority> 1.5")));
        assert!(validation.errors.iter().any(|e| e.contains("duplicate <loc>")));
        assert!(validation.errors.iter().any(|e| e.contains("<changefreq> sometimes")));
        assert!(validation.errors.iter().any(|e| e.contains("not an absolute")));
        assert!(validation.errors.iter().any(|e| e.contains("in the future")));
    }

    #[test]
    fn missing_declaration_and_namespace_are_rejected() {
        let config = SeoConfig::default();
        let generator = SitemapGenerator::with_today(&config, today());

        let validation = generator
            .validate_sitemap(r#"<urlset xmlns="http://example.com/ns"><url><loc>https://example.com/</loc></url></urlset>"#);
        assert_eq!(validation.errors.len(), 2);
    }

    #[test]
    fn url_limit_is_enforced() {
        let config = SeoConfig::default();
        let generator = SitemapGenerator::with_today(&config, today());
        let mut xml = format!("<?xml version=\"1.0\"?>\n<urlset xmlns=\"{SITEMAP_NS}\">");
        for i in 0..50_001 {
            xml.push_str(&format!("<url><loc>https://example.com/page{i}</loc></url>"));
        }
        xml.push_str("</urlset>");

        let validation = generator.validate_sitemap(&xml);
        assert!(validation.errors.iter().any(|e| e.contains("exceeds 50,000")));
    }

    #[test]
    fn robots_txt_lists_disallows_and_sitemap() {
        let mut config = SeoConfig::default();
        config.sitemap.disallow = vec!["/admin".into(), "/drafts/".into()];
        let generator = SitemapGenerator::with_today(&config, today());

        let robots = generator.generate_robots_txt("https://example.com/sitemap.xml");
        assert!(robots.starts_with("User-agent: *\nAllow: /\n"));
        assert!(robots.contains("Disallow: /admin\nDisallow: /drafts/\n"));
        assert!(robots.contains("Sitemap: https://example.com/sitemap.xml"));
    }

    #[test]
    fn write_files_creates_both_outputs() {
        let config = SeoConfig::default();
        let generator = SitemapGenerator::with_today(&config, today());
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("public");

        generator.write_files(&catalog(), &out).unwrap();

        let xml = fs::read_to_string(out.join("sitemap.xml")).unwrap();
        let robots = fs::read_to_string(out.join("robots.txt")).unwrap();
        assert!(generator.validate_sitemap(&xml).valid);
        assert!(robots.contains(&format!("Sitemap: {}", config.sitemap_url())));
    }
}
