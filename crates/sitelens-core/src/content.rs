//! Body content checks
//!
//! Validates the rendered HTML of a page for length, keyword density,
//! heading structure and a mention of the page's location. Text is pulled
//! out with an HTML parser; `<script>` and `<style>` bodies are ignored.

use crate::config::SeoConfig;
use crate::text::{count_phrase, tokenize};
use crate::types::{BulkUpdateResult, PageRecord, SeoPage, ValidationCheck};
use scraper::{Html, Selector};
use serde::Serialize;
use serde_json::json;

/// Outcome of validating one page body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentReport {
    pub word_count: usize,
    /// Share of words taken by the primary keyword, 0.0..=1.0
    pub keyword_density: f64,
    pub checks: Vec<ValidationCheck>,
    /// Non-failing findings such as secondary keyword stuffing
    pub warnings: Vec<String>,
}

impl ContentReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }

    pub fn failures(&self) -> Vec<String> {
        self.checks
            .iter()
            .filter(|check| !check.passed)
            .map(|check| format!("{}: {}", check.name, check.message))
            .collect()
    }
}

pub struct ContentValidator<'a> {
    config: &'a SeoConfig,
}

impl<'a> ContentValidator<'a> {
    pub fn new(config: &'a SeoConfig) -> Self {
        Self { config }
    }

    pub fn validate_page(&self, record: &PageRecord) -> ContentReport {
        let Some(html) = record.content.as_deref().filter(|html| !html.trim().is_empty()) else {
            return ContentReport {
                word_count: 0,
                keyword_density: 0.0,
                checks: vec![ValidationCheck::new(
                    "content_present",
                    false,
                    "page has no body content",
                )],
                warnings: Vec::new(),
            };
        };

        let settings = &self.config.content;
        let fragment = Html::parse_fragment(html);
        let words = tokenize(&visible_text(&fragment));
        let word_count = words.len();
        let keywords = record.target_keywords();

        let mut checks = Vec::new();
        let mut warnings = Vec::new();

        checks.push(
            ValidationCheck::new(
                "word_count",
                word_count >= settings.min_word_count,
                format!(
                    "{word_count} words, minimum is {}",
                    settings.min_word_count
                ),
            )
            .with_details(json!({ "wordCount": word_count })),
        );

        let keyword_density = match keywords.first() {
            Some(primary) => {
                let density = density(&words, primary);
                let in_range = (settings.min_keyword_density..=settings.max_keyword_density)
                    .contains(&density);
                checks.push(
                    ValidationCheck::new(
                        "keyword_density",
                        in_range,
                        format!(
                            "\"{primary}\" density {:.2}%, expected {:.2}%-{:.2}%",
                            density * 100.0,
                            settings.min_keyword_density * 100.0,
                            settings.max_keyword_density * 100.0
                        ),
                    )
                    .with_details(json!({ "keyword": primary, "density": density })),
                );
                density
            }
            None => {
                checks.push(ValidationCheck::new(
                    "keyword_density",
                    false,
                    "page has no target keyword",
                ));
                0.0
            }
        };

        for secondary in keywords.iter().skip(1) {
            let density = density(&words, secondary);
            if density > settings.max_keyword_density {
                warnings.push(format!(
                    "secondary keyword \"{secondary}\" density {:.2}% exceeds {:.2}%",
                    density * 100.0,
                    settings.max_keyword_density * 100.0
                ));
            }
        }

        let subheadings = count_elements(&fragment, "h2, h3, h4, h5, h6");
        checks.push(ValidationCheck::new(
            "subheadings",
            subheadings > 0,
            format!("{subheadings} subheadings (h2-h6)"),
        ));

        let location = record.location.trim();
        if location.is_empty() {
            checks.push(ValidationCheck::new(
                "location_mention",
                true,
                "page has no location",
            ));
        } else {
            let mentioned = count_phrase(&words, location) > 0;
            checks.push(ValidationCheck::new(
                "location_mention",
                mentioned,
                if mentioned {
                    format!("body mentions {location}")
                } else {
                    format!("body never mentions {location}")
                },
            ));
        }

        ContentReport {
            word_count,
            keyword_density,
            checks,
            warnings,
        }
    }

    /// Validate every page and record its word count
    pub fn validate_pages(&self, pages: &mut [SeoPage]) -> BulkUpdateResult {
        let mut result = BulkUpdateResult::default();

        for page in pages.iter_mut() {
            let report = self.validate_page(&page.record);
            page.word_count = report.word_count;

            for warning in &report.warnings {
                log::debug!("{}: {}", page.url(), warning);
            }

            if report.passed() {
                result.record_success(page.url());
            } else {
                result.record_failure(page.url(), report.failures());
            }
        }

        log::info!(
            "content stage: {} pages passed, {} failed",
            result.successful_pages.len(),
            result.failed_pages.len()
        );
        result
    }
}

fn density(words: &[String], keyword: &str) -> f64 {
    if words.is_empty() {
        return 0.0;
    }
    count_phrase(words, keyword) as f64 / words.len() as f64
}

/// Text content outside `<script>` and `<style>`
pub(crate) fn visible_text(fragment: &Html) -> String {
    let mut text = String::new();

    for node in fragment.root_element().descendants() {
        let Some(chunk) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| matches!(element.name(), "script" | "style"))
        });
        if !hidden {
            text.push_str(chunk);
            text.push(' ');
        }
    }

    text
}

fn count_elements(document: &Html, selector_str: &str) -> usize {
    if let Ok(selector) = Selector::parse(selector_str) {
        document.select(&selector).count()
    } else {
        0
    }
}
