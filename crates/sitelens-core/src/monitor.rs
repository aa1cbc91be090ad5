//! SEO health checks
//!
//! Read-only inspection of page records. Each finding is an [`SeoIssue`]
//! classified by severity; a page's score starts at 100 and loses points per
//! issue. Nothing here mutates the catalog or keeps history between runs.

use crate::catalog::{CatalogIssueKind, integrity_issues};
use crate::config::SeoConfig;
use crate::content::ContentValidator;
use crate::links::{LinkManager, LinkProblem};
use crate::meta::MetaManager;
use crate::schema::{check_local_business, check_service};
use crate::text::{char_len, contains_phrase};
use crate::types::{IssueKind, PageRecord, SeoIssue, SeoPage, Severity};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Issues and score for one page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageHealth {
    pub url: String,
    pub score: u8,
    pub issues: Vec<SeoIssue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub pages: Vec<PageHealth>,
    /// Cross-page findings: duplicate urls, dangling and self links
    pub catalog_issues: Vec<SeoIssue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoReport {
    pub average_score: f64,
    pub total_issues: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    pub pages: Vec<PageHealth>,
    pub catalog_issues: Vec<SeoIssue>,
}

/// Score a page from its issues, floored at zero
pub fn score(issues: &[SeoIssue]) -> u8 {
    let mut score = 100u32;
    for issue in issues {
        score = score.saturating_sub(issue.severity.deduction());
    }
    score.min(100) as u8
}

pub struct SeoMonitor<'a> {
    config: &'a SeoConfig,
}

impl<'a> SeoMonitor<'a> {
    pub fn new(config: &'a SeoConfig) -> Self {
        Self { config }
    }

    pub fn detect_seo_issues(&self, record: &PageRecord) -> Vec<SeoIssue> {
        let mut issues = Vec::new();
        let url = record.url.as_str();
        let meta = &self.config.meta;
        let meta_manager = MetaManager::new(self.config);
        let keywords = record.target_keywords();

        let mut push = |severity: Severity, kind: IssueKind, message: String| {
            issues.push(SeoIssue::new(url, severity, kind, message));
        };

        for (field, value) in [
            ("title", &record.title),
            ("meta description", &record.meta_description),
            ("h1", &record.h1),
            ("canonical url", &record.canonical_url),
        ] {
            if value.trim().is_empty() {
                push(Severity::Critical, IssueKind::MissingField, format!("missing {field}"));
            }
        }

        let title_len = char_len(&record.title);
        if !record.title.trim().is_empty() && !(meta.title_min..=meta.title_max).contains(&title_len) {
            push(
                Severity::Warning,
                IssueKind::LengthOutOfRange,
                format!(
                    "title is {title_len} characters, expected {}-{}",
                    meta.title_min, meta.title_max
                ),
            );
        }

        let description_len = char_len(&record.meta_description);
        if !record.meta_description.trim().is_empty()
            && !(meta.description_tolerance_min..=meta.description_tolerance_max)
                .contains(&description_len)
        {
            push(
                Severity::Warning,
                IssueKind::LengthOutOfRange,
                format!(
                    "meta description is {description_len} characters, expected {}-{}",
                    meta.description_tolerance_min, meta.description_tolerance_max
                ),
            );
        }

        if !record.h1.trim().is_empty() {
            let h1_len = char_len(&record.h1);
            if !(meta.h1_min..=meta.h1_max).contains(&h1_len) {
                push(
                    Severity::Warning,
                    IssueKind::LengthOutOfRange,
                    format!("h1 is {h1_len} characters, expected {}-{}", meta.h1_min, meta.h1_max),
                );
            }
            let location = record.location.trim();
            if !location.is_empty() && !contains_phrase(&record.h1, location) {
                push(
                    Severity::Warning,
                    IssueKind::KeywordMissing,
                    format!("h1 does not mention {location}"),
                );
            }
            if !keywords.is_empty()
                && !keywords
                    .iter()
                    .any(|keyword| contains_phrase(&record.h1, keyword))
            {
                push(
                    Severity::Warning,
                    IssueKind::KeywordMissing,
                    "h1 contains none of the target keywords".to_string(),
                );
            }
        }

        if !record.canonical_url.trim().is_empty() && !meta_manager.is_self_canonical(record) {
            push(
                Severity::Warning,
                IssueKind::CanonicalMismatch,
                format!("canonical {} does not point at the page itself", record.canonical_url),
            );
        }

        match &record.schema.local_business {
            None => push(
                Severity::Critical,
                IssueKind::Schema,
                "missing LocalBusiness schema".to_string(),
            ),
            Some(block) => {
                let check = check_local_business(block);
                for field in check.missing_required {
                    push(
                        Severity::Critical,
                        IssueKind::Schema,
                        format!("LocalBusiness schema missing {field}"),
                    );
                }
                for field in check.missing_optional {
                    push(
                        Severity::Info,
                        IssueKind::MissingOptional,
                        format!("LocalBusiness schema has no {field}"),
                    );
                }
            }
        }

        match &record.schema.service {
            None if record.kind().is_service() => push(
                Severity::Critical,
                IssueKind::Schema,
                "missing Service schema".to_string(),
            ),
            None => {}
            Some(block) => {
                let check = check_service(block);
                for field in check.missing_required {
                    push(
                        Severity::Critical,
                        IssueKind::Schema,
                        format!("Service schema missing {field}"),
                    );
                }
                for field in check.missing_optional {
                    push(
                        Severity::Info,
                        IssueKind::MissingOptional,
                        format!("Service schema has no {field}"),
                    );
                }
            }
        }

        if let Ok(page) = SeoPage::try_from(record.clone()) {
            // Dangling targets need the whole catalog; the bulk check reports them
            let no_catalog = HashSet::new();
            for problem in LinkManager::new(self.config).validate_links(&page, &no_catalog) {
                let kind = match problem {
                    LinkProblem::TooFew { .. } | LinkProblem::TooMany { .. } => IssueKind::LinkCount,
                    LinkProblem::Dangling(_) => continue,
                    LinkProblem::SelfLink(_) | LinkProblem::Duplicate(_) => IssueKind::InvalidLink,
                };
                push(Severity::Warning, kind, problem.to_string());
            }
        } else {
            push(
                Severity::Critical,
                IssueKind::InvalidLink,
                format!("page url {url:?} is not a site path"),
            );
        }

        let content = ContentValidator::new(self.config).validate_page(record);
        for failure in content.failures() {
            push(Severity::Warning, IssueKind::Content, failure);
        }

        let has_og_image = record
            .open_graph
            .get("og:image")
            .is_some_and(|image| !image.trim().is_empty());
        if !has_og_image && record.image.is_none() {
            push(
                Severity::Info,
                IssueKind::MissingOptional,
                "no og:image or page image".to_string(),
            );
        }

        if record.last_modified.is_none() {
            push(
                Severity::Info,
                IssueKind::MissingOptional,
                "no lastModified date".to_string(),
            );
        }

        issues
    }

    pub fn perform_bulk_health_check(&self, pages: &[PageRecord]) -> HealthCheck {
        let pages_health: Vec<PageHealth> = pages
            .iter()
            .map(|record| {
                let issues = self.detect_seo_issues(record);
                PageHealth {
                    url: record.url.clone(),
                    score: score(&issues),
                    issues,
                }
            })
            .collect();

        let catalog_issues: Vec<SeoIssue> = integrity_issues(pages)
            .into_iter()
            .map(|issue| {
                let kind = match issue.kind {
                    CatalogIssueKind::DuplicateUrl => IssueKind::DuplicateUrl,
                    _ => IssueKind::InvalidLink,
                };
                SeoIssue::new(issue.url.clone(), issue.severity(), kind, issue.message)
            })
            .collect();

        log::info!(
            "health check: {} pages, {} catalog issues",
            pages_health.len(),
            catalog_issues.len()
        );

        HealthCheck {
            pages: pages_health,
            catalog_issues,
        }
    }

    pub fn generate_seo_report(&self, pages: &[PageRecord]) -> SeoReport {
        let HealthCheck {
            pages,
            catalog_issues,
        } = self.perform_bulk_health_check(pages);

        let mut by_severity: BTreeMap<Severity, usize> = [Severity::Info, Severity::Warning, Severity::Critical]
            .into_iter()
            .map(|severity| (severity, 0))
            .collect();
        for issue in pages
            .iter()
            .flat_map(|page| page.issues.iter())
            .chain(catalog_issues.iter())
        {
            *by_severity.entry(issue.severity).or_insert(0) += 1;
        }

        let average_score = if pages.is_empty() {
            100.0
        } else {
            pages.iter().map(|page| f64::from(page.score)).sum::<f64>() / pages.len() as f64
        };

        SeoReport {
            average_score,
            total_issues: by_severity.values().sum(),
            by_severity,
            pages,
            catalog_issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::SeoIntegrationService;
    use crate::types::RelatedService;

    fn issue(severity: Severity) -> SeoIssue {
        SeoIssue::new("/x", severity, IssueKind::Content, "x")
    }

    #[test]
    fn score_deducts_per_severity_and_floors_at_zero() {
        assert_eq!(score(&[]), 100);
        assert_eq!(
            score(&[issue(Severity::Critical), issue(Severity::Warning), issue(Severity::Info)]),
            74
        );
        assert_eq!(score(&vec![issue(Severity::Critical); 6]), 0);
    }

    #[test]
    fn bare_record_reports_missing_fields_as_critical() {
        let config = SeoConfig::default();
        let record = PageRecord::new("/pu-polish-in-bandra", "PU Polish", "Bandra");
        let issues = SeoMonitor::new(&config).detect_seo_issues(&record);

        let critical: Vec<&str> = issues
            .iter()
            .filter(|i| i.severity == Severity::Critical)
            .map(|i| i.message.as_str())
            .collect();
        assert_eq!(
            critical,
            vec![
                "missing title",
                "missing meta description",
                "missing h1",
                "missing canonical url",
                "missing LocalBusiness schema",
                "missing Service schema",
            ]
        );
        assert!(issues.iter().any(|i| i.kind == IssueKind::LinkCount));
        assert!(issues.iter().any(|i| i.kind == IssueKind::Content));
    }

    #[test]
    fn processed_record_has_no_critical_issues() {
        let config = SeoConfig::default();
        let record = PageRecord::new("/pu-polish-in-bandra", "PU Polish", "Bandra");
        let processed = SeoIntegrationService::new(&config).process_page(&record);

        let issues = SeoMonitor::new(&config).detect_seo_issues(&processed);
        assert!(issues.iter().all(|i| i.severity != Severity::Critical), "{issues:?}");
        assert!(issues
            .iter()
            .any(|i| i.kind == IssueKind::MissingOptional && i.message.contains("geo")));
    }

    #[test]
    fn wrong_canonical_and_h1_are_warnings() {
        let config = SeoConfig::default();
        let mut record = PageRecord::new("/pu-polish-in-bandra", "PU Polish", "Bandra");
        record.h1 = "Furniture Polishing Experts Nearby".into();
        record.canonical_url = "https://www.mumbaifurniturepolish.com/elsewhere".into();

        let issues = SeoMonitor::new(&config).detect_seo_issues(&record);
        let warnings: Vec<IssueKind> = issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .map(|i| i.kind)
            .collect();
        assert_eq!(
            warnings.iter().filter(|k| **k == IssueKind::KeywordMissing).count(),
            2
        );
        assert!(warnings.contains(&IssueKind::CanonicalMismatch));
    }

    #[test]
    fn report_aggregates_pages_and_catalog_issues() {
        let config = SeoConfig::default();
        let mut first = PageRecord::new("/pu-polish-in-bandra", "PU Polish", "Bandra");
        first.related_services = vec![RelatedService {
            name: "Gone".into(),
            url: "/gone".into(),
        }];
        let pages = vec![
            first,
            PageRecord::new("/pu-polish-in-juhu", "PU Polish", "Juhu"),
            PageRecord::new("/pu-polish-in-juhu", "PU Polish", "Juhu"),
        ];

        let report = SeoMonitor::new(&config).generate_seo_report(&pages);

        assert_eq!(report.pages.len(), 3);
        assert_eq!(report.catalog_issues.len(), 2);
        assert_eq!(report.catalog_issues[0].kind, IssueKind::DuplicateUrl);
        assert_eq!(report.catalog_issues[0].severity, Severity::Critical);
        assert_eq!(report.catalog_issues[1].severity, Severity::Warning);

        let page_issues: usize = report.pages.iter().map(|p| p.issues.len()).sum();
        assert_eq!(report.total_issues, page_issues + 2);
        let expected_average =
            report.pages.iter().map(|p| f64::from(p.score)).sum::<f64>() / 3.0;
        assert!((report.average_score - expected_average).abs() < 1e-9);
    }
}
