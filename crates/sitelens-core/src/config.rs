//! Pipeline configuration (`sitelens.toml`).
//!
//! Every section and field has a default, so an empty file is a valid
//! configuration:
//!
//! ```toml
//! [site]
//! url = "https://www.mumbaifurniturepolish.com"
//! name = "Mumbai Furniture Polish"
//!
//! [links]
//! min_outgoing_links = 3
//! max_outgoing_links = 10
//!
//! [sitemap]
//! premium_keywords = ["pu polish", "bandra", "juhu"]
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoConfig {
    pub site: SiteConfig,
    pub business: BusinessConfig,
    pub meta: MetaConfig,
    pub links: LinkConfig,
    pub content: ContentConfig,
    pub sitemap: SitemapConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Absolute https origin the site is served from
    pub url: String,
    /// Used for `og:site_name` and title suffixes
    pub name: String,
    /// Fallback share image when a page has none
    pub default_image: String,
    /// Sitemap location relative to the site root
    pub sitemap_path: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: "https://www.mumbaifurniturepolish.com".to_string(),
            name: "Mumbai Furniture Polish".to_string(),
            default_image: "/images/og-default.jpg".to_string(),
            sitemap_path: "sitemap.xml".to_string(),
        }
    }
}

/// Business details embedded in the `LocalBusiness` JSON-LD
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessConfig {
    pub name: String,
    pub telephone: Option<String>,
    pub street_address: String,
    pub locality: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub opening_hours: Vec<String>,
    pub rating_value: Option<f32>,
    pub review_count: Option<u32>,
    pub price_range: Option<String>,
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            name: "Mumbai Furniture Polish".to_string(),
            telephone: None,
            street_address: String::new(),
            locality: "Mumbai".to_string(),
            region: "Maharashtra".to_string(),
            postal_code: String::new(),
            country: "IN".to_string(),
            latitude: None,
            longitude: None,
            opening_hours: vec!["Mo-Sa 09:00-19:00".to_string()],
            rating_value: None,
            review_count: None,
            price_range: Some("₹₹".to_string()),
        }
    }
}

/// Length bounds for generated tags. All lengths count characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaConfig {
    pub title_min: usize,
    pub title_max: usize,
    pub description_min: usize,
    pub description_max: usize,
    /// Looser range the monitor applies before raising a warning
    pub description_tolerance_min: usize,
    pub description_tolerance_max: usize,
    pub h1_min: usize,
    pub h1_max: usize,
    pub action_words: Vec<String>,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            title_min: 30,
            title_max: 60,
            description_min: 150,
            description_max: 160,
            description_tolerance_min: 140,
            description_tolerance_max: 165,
            h1_min: 20,
            h1_max: 70,
            action_words: [
                "get",
                "book",
                "call",
                "contact",
                "expert",
                "professional",
                "quality",
                "affordable",
            ]
            .iter()
            .map(|word| word.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub min_outgoing_links: usize,
    pub max_outgoing_links: usize,
    /// Accepted for compatibility; link selection does not act on it.
    pub avoid_circular_references: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            min_outgoing_links: 3,
            max_outgoing_links: 10,
            avoid_circular_references: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub min_word_count: usize,
    /// Fractions of total words, not percentages
    pub min_keyword_density: f64,
    pub max_keyword_density: f64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            min_word_count: 300,
            min_keyword_density: 0.01,
            max_keyword_density: 0.03,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SitemapConfig {
    /// Service or location names (case-insensitive) that raise page priority
    pub premium_keywords: Vec<String>,
    /// Extra `Disallow:` paths for robots.txt
    pub disallow: Vec<String>,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            premium_keywords: vec![
                "pu polish".to_string(),
                "wood polishing".to_string(),
                "bandra".to_string(),
                "juhu".to_string(),
                "andheri".to_string(),
            ],
            disallow: Vec::new(),
        }
    }
}

impl SeoConfig {
    /// Parse configuration from a TOML string and validate it
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_toml_str(&content)
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        match url::Url::parse(&self.site.url) {
            Ok(parsed) if parsed.scheme() == "https" && parsed.host_str().is_some() => {}
            _ => {
                return Err(ConfigError::invalid(
                    "site.url",
                    format!("expected an absolute https url, got {:?}", self.site.url),
                ));
            }
        }

        let ranges = [
            ("meta.title_min", self.meta.title_min, self.meta.title_max),
            (
                "meta.description_min",
                self.meta.description_min,
                self.meta.description_max,
            ),
            (
                "meta.description_tolerance_min",
                self.meta.description_tolerance_min,
                self.meta.description_tolerance_max,
            ),
            ("meta.h1_min", self.meta.h1_min, self.meta.h1_max),
            (
                "links.min_outgoing_links",
                self.links.min_outgoing_links,
                self.links.max_outgoing_links,
            ),
        ];
        for (field, min, max) in ranges {
            if min > max {
                return Err(ConfigError::invalid(
                    field,
                    format!("minimum {min} exceeds maximum {max}"),
                ));
            }
        }

        if self.meta.action_words.is_empty() {
            return Err(ConfigError::invalid(
                "meta.action_words",
                "at least one action word is required",
            ));
        }

        let density = &self.content;
        if !(0.0..=1.0).contains(&density.min_keyword_density)
            || !(0.0..=1.0).contains(&density.max_keyword_density)
            || density.min_keyword_density > density.max_keyword_density
        {
            return Err(ConfigError::invalid(
                "content.min_keyword_density",
                format!(
                    "densities must satisfy 0 <= min <= max <= 1, got {} and {}",
                    density.min_keyword_density, density.max_keyword_density
                ),
            ));
        }

        Ok(())
    }

    /// Absolute url of the sitemap
    pub fn sitemap_url(&self) -> String {
        crate::url_utils::absolute_url(&self.site.url, &self.site.sitemap_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = SeoConfig::from_toml_str("").unwrap();
        assert_eq!(config.links.min_outgoing_links, 3);
        assert_eq!(config.links.max_outgoing_links, 10);
        assert_eq!(config.meta.description_min, 150);
        assert_eq!(config.meta.description_max, 160);
        assert_eq!(config.content.min_word_count, 300);
        assert_eq!(config.meta.action_words.len(), 8);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = SeoConfig::from_toml_str(
            r#"
[site]
url = "https://example.com"

[links]
min_outgoing_links = 2
"#,
        )
        .unwrap();

        assert_eq!(config.site.url, "https://example.com");
        assert_eq!(config.site.name, "Mumbai Furniture Polish");
        assert_eq!(config.links.min_outgoing_links, 2);
        assert_eq!(config.links.max_outgoing_links, 10);
    }

    #[test]
    fn rejects_inverted_ranges() {
        let err = SeoConfig::from_toml_str(
            r#"
[meta]
h1_min = 80
h1_max = 70
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("meta.h1_min"));
    }

    #[test]
    fn rejects_plain_http_site_url() {
        let err = SeoConfig::from_toml_str(
            r#"
[site]
url = "http://example.com"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("site.url"));
    }

    #[test]
    fn rejects_density_out_of_range() {
        let err = SeoConfig::from_toml_str(
            r#"
[content]
min_keyword_density = 0.05
max_keyword_density = 0.03
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("densities"));
    }

    #[test]
    fn sitemap_url_is_absolute() {
        let config = SeoConfig::default();
        assert_eq!(
            config.sitemap_url(),
            "https://www.mumbaifurniturepolish.com/sitemap.xml"
        );
    }

    #[test]
    fn reads_config_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitelens.toml");
        fs::write(&path, "[site]\nname = \"Polish Co\"\n").unwrap();

        let config = SeoConfig::from_path(&path).unwrap();
        assert_eq!(config.site.name, "Polish Co");

        let missing = SeoConfig::from_path(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io(..)));
    }
}
