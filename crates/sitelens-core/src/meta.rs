//! Title, meta description, H1, canonical and social tag generation
//!
//! Generators never fail. A value that already satisfies its rules is
//! returned unchanged, so running the stage twice produces identical output.
//! Anything else is rebuilt from the page's own fields.

use crate::config::SeoConfig;
use crate::text::{char_len, contains_phrase, display_case, fit_length};
use crate::types::{PageRecord, SeoPage};
use crate::url_utils::{absolute_url, site_page_url};
use std::collections::BTreeMap;

/// Longest keyword or service text placed into a template
const MAX_TEMPLATE_TOKEN: usize = 60;

pub struct MetaManager<'a> {
    config: &'a SeoConfig,
}

impl<'a> MetaManager<'a> {
    pub fn new(config: &'a SeoConfig) -> Self {
        Self { config }
    }

    pub fn validate_meta_description_length(&self, description: &str) -> bool {
        let len = char_len(description);
        (self.config.meta.description_min..=self.config.meta.description_max).contains(&len)
    }

    pub fn has_action_word(&self, text: &str) -> bool {
        self.config
            .meta
            .action_words
            .iter()
            .any(|word| contains_phrase(text, word))
    }

    /// Location is only required when the page has one
    fn mentions_location(text: &str, location: &str) -> bool {
        let location = location.trim();
        location.is_empty() || contains_phrase(text, location)
    }

    fn mentions_keyword(text: &str, keywords: &[String]) -> bool {
        keywords.is_empty() || keywords.iter().any(|keyword| contains_phrase(text, keyword))
    }

    pub fn is_valid_h1(&self, h1: &str, location: &str, keywords: &[String]) -> bool {
        let len = char_len(h1.trim());
        (self.config.meta.h1_min..=self.config.meta.h1_max).contains(&len)
            && Self::mentions_location(h1, location)
            && Self::mentions_keyword(h1, keywords)
    }

    pub fn is_valid_title(&self, title: &str, keywords: &[String]) -> bool {
        let len = char_len(title.trim());
        (self.config.meta.title_min..=self.config.meta.title_max).contains(&len)
            && Self::mentions_keyword(title, keywords)
    }

    pub fn is_valid_description(&self, description: &str, location: &str) -> bool {
        self.validate_meta_description_length(description)
            && Self::mentions_location(description, location)
            && self.has_action_word(description)
    }

    /// Keywords to try in templates, falling back to the site name
    fn template_keywords(&self, record: &PageRecord, keywords: &[String]) -> Vec<String> {
        let service = record.service_name.trim();
        let mut out: Vec<String> = keywords
            .iter()
            .map(|keyword| keyword.trim())
            .filter(|keyword| !keyword.is_empty())
            .map(|keyword| {
                if keyword.eq_ignore_ascii_case(service) {
                    clip(service, MAX_TEMPLATE_TOKEN)
                } else {
                    display_case(&clip(keyword, MAX_TEMPLATE_TOKEN))
                }
            })
            .collect();
        if out.is_empty() {
            out.push(self.config.site.name.clone());
        }
        out
    }

    fn locality(&self) -> &str {
        &self.config.business.locality
    }

    pub fn generate_h1_tag(&self, record: &PageRecord, keywords: &[String]) -> String {
        if self.is_valid_h1(&record.h1, &record.location, keywords) {
            return record.h1.clone();
        }

        let min = self.config.meta.h1_min;
        let max = self.config.meta.h1_max;
        let location = record.location.trim();
        let locality = self.locality();

        let candidates_for = |keyword: &str| -> Vec<String> {
            if location.is_empty() {
                vec![
                    keyword.to_string(),
                    format!("Professional {keyword} Services"),
                    format!("Professional {keyword} Services in {locality}"),
                ]
            } else if location.eq_ignore_ascii_case(locality) {
                vec![
                    format!("{keyword} in {location}"),
                    format!("Professional {keyword} in {location}"),
                    format!("Professional {keyword} Services in {location}"),
                ]
            } else {
                vec![
                    format!("{keyword} in {location}"),
                    format!("Professional {keyword} in {location}"),
                    format!("Professional {keyword} Services in {location}, {locality}"),
                ]
            }
        };

        let keywords = self.template_keywords(record, keywords);
        if let Some(found) = pick_in_range(
            keywords.iter().flat_map(|k| candidates_for(k.as_str())),
            min,
            max,
        ) {
            return found;
        }

        let seed = candidates_for(keywords[0].as_str()).remove(0);
        fit_length(
            &seed,
            min,
            max,
            &[" Services".to_string(), format!(" across {locality}")],
        )
    }

    pub fn generate_title(&self, record: &PageRecord, keywords: &[String]) -> String {
        if self.is_valid_title(&record.title, keywords) {
            return record.title.clone();
        }

        let min = self.config.meta.title_min;
        let max = self.config.meta.title_max;
        let site = &self.config.site.name;
        let location = record.location.trim();

        let candidates_for = |keyword: &str| -> Vec<String> {
            if location.is_empty() {
                vec![
                    format!("{keyword} | {site}"),
                    format!("Professional {keyword} | {site}"),
                    format!("Professional {keyword} Services | {site}"),
                    keyword.to_string(),
                ]
            } else {
                vec![
                    format!("{keyword} in {location} | {site}"),
                    format!("{keyword} in {location}"),
                    format!("Professional {keyword} in {location} | {site}"),
                    format!("Professional {keyword} Services in {location} | {site}"),
                ]
            }
        };

        let keywords = self.template_keywords(record, keywords);
        if let Some(found) = pick_in_range(
            keywords.iter().flat_map(|k| candidates_for(k.as_str())),
            min,
            max,
        ) {
            return found;
        }

        let seed = candidates_for(keywords[0].as_str()).remove(0);
        fit_length(
            &seed,
            min,
            max,
            &[
                " - Expert Furniture Polishing".to_string(),
                format!(" in {}", self.locality()),
            ],
        )
    }

    pub fn generate_meta_description(&self, record: &PageRecord, keywords: &[String]) -> String {
        if self.is_valid_description(&record.meta_description, &record.location) {
            return record.meta_description.clone();
        }
        let existing = record.meta_description.trim();

        let min = self.config.meta.description_min;
        let max = self.config.meta.description_max;
        let padding = self.description_padding();

        // Keep the author's wording when only the length is off
        if !existing.is_empty()
            && Self::mentions_location(existing, &record.location)
            && self.has_action_word(existing)
        {
            let fitted = fit_length(existing, min, max, &padding);
            if self.is_valid_description(&fitted, &record.location) {
                return fitted;
            }
        }

        let subject = if record.service_name.trim().is_empty() {
            self.template_keywords(record, keywords).remove(0)
        } else {
            clip(record.service_name.trim(), MAX_TEMPLATE_TOKEN)
        };
        let site = &self.config.site.name;
        let location = record.location.trim();
        let seed = if location.is_empty() {
            format!(
                "Get professional {subject} across {} from {site}.",
                self.locality()
            )
        } else {
            format!("Get professional {subject} in {location} from {site}.")
        };

        fit_length(&seed, min, max, &padding)
    }

    fn description_padding(&self) -> Vec<String> {
        vec![
            " Expert craftsmen restore, polish and protect your furniture at home.".to_string(),
            " Affordable, transparent pricing with a free on-site inspection.".to_string(),
            " Call or book online today for a quality finish that lasts.".to_string(),
            format!(" Serving homes and offices across {}.", self.locality()),
        ]
    }

    /// Absolute https url of the page itself
    pub fn generate_canonical_tag(&self, record: &PageRecord) -> String {
        site_page_url(&self.config.site.url, &record.url)
    }

    pub fn is_self_canonical(&self, record: &PageRecord) -> bool {
        !record.canonical_url.is_empty()
            && record.canonical_url == self.generate_canonical_tag(record)
    }

    fn share_image(&self, record: &PageRecord) -> String {
        let image = record
            .image
            .as_deref()
            .filter(|image| !image.trim().is_empty())
            .unwrap_or(&self.config.site.default_image);
        absolute_url(&self.config.site.url, image)
    }

    fn share_title(record: &PageRecord) -> String {
        if record.title.trim().is_empty() {
            record.h1.clone()
        } else {
            record.title.clone()
        }
    }

    pub fn generate_open_graph_tags(&self, record: &PageRecord) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("og:title".to_string(), Self::share_title(record)),
            (
                "og:description".to_string(),
                record.meta_description.clone(),
            ),
            ("og:image".to_string(), self.share_image(record)),
            ("og:url".to_string(), self.generate_canonical_tag(record)),
            ("og:type".to_string(), "website".to_string()),
            ("og:site_name".to_string(), self.config.site.name.clone()),
        ])
    }

    pub fn generate_twitter_card_tags(&self, record: &PageRecord) -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                "twitter:card".to_string(),
                "summary_large_image".to_string(),
            ),
            ("twitter:title".to_string(), Self::share_title(record)),
            (
                "twitter:description".to_string(),
                record.meta_description.clone(),
            ),
            ("twitter:image".to_string(), self.share_image(record)),
        ])
    }

    /// Fill every missing or invalid tag on the page
    pub fn apply(&self, page: &mut SeoPage) {
        let keywords = page.record.target_keywords();
        let record = &mut page.record;

        record.h1 = self.generate_h1_tag(record, &keywords);
        record.meta_description = self.generate_meta_description(record, &keywords);
        record.title = self.generate_title(record, &keywords);
        record.canonical_url = self.generate_canonical_tag(record);

        let open_graph = self.generate_open_graph_tags(record);
        merge_tags(&mut record.open_graph, open_graph, &["og:image"]);
        let twitter = self.generate_twitter_card_tags(record);
        merge_tags(&mut record.twitter, twitter, &["twitter:image"]);
    }
}

/// Overwrite derived tags; keep non-empty values of `preserved` keys
fn merge_tags(
    existing: &mut BTreeMap<String, String>,
    generated: BTreeMap<String, String>,
    preserved: &[&str],
) {
    for (key, value) in generated {
        let keep = preserved.contains(&key.as_str())
            && existing
                .get(&key)
                .is_some_and(|current| !current.trim().is_empty());
        if !keep {
            existing.insert(key, value);
        }
    }
}

fn pick_in_range(
    candidates: impl IntoIterator<Item = String>,
    min: usize,
    max: usize,
) -> Option<String> {
    candidates
        .into_iter()
        .find(|candidate| (min..=max).contains(&char_len(candidate)))
}

fn clip(text: &str, max: usize) -> String {
    if char_len(text) <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    match cut.rfind(' ') {
        Some(idx) if idx > 0 => cut[..idx].to_string(),
        _ => cut,
    }
}
