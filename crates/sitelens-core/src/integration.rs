//! Pipeline orchestration
//!
//! Runs links → content → meta/schema → performance over a whole catalog.
//! Stage failures are collected per page and logged; a record that cannot be
//! converted into a [`SeoPage`] is passed through untouched in its original
//! position.

use crate::config::SeoConfig;
use crate::content::ContentValidator;
use crate::links::LinkManager;
use crate::meta::MetaManager;
use crate::monitor::{SeoMonitor, score};
use crate::performance::PerformanceOptimizer;
use crate::schema::SchemaBuilder;
use crate::types::{BulkUpdateResult, PageAnalysis, PageRecord, SeoPage};
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-stage outcome of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub links: BulkUpdateResult,
    pub content: BulkUpdateResult,
    pub meta: BulkUpdateResult,
    pub performance: BulkUpdateResult,
    /// Records passed through unprocessed, with the reason
    pub rejected: BTreeMap<String, String>,
    /// Word count, outgoing links, image hints and score of each processed page
    pub pages: BTreeMap<String, PageAnalysis>,
}

enum Slot {
    Page(usize),
    Rejected(PageRecord),
}

pub struct SeoIntegrationService<'a> {
    config: &'a SeoConfig,
}

impl<'a> SeoIntegrationService<'a> {
    pub fn new(config: &'a SeoConfig) -> Self {
        Self { config }
    }

    /// Fill meta tags and schema on one record.
    ///
    /// Valid values are never replaced, so a second call returns an
    /// identical record.
    pub fn process_page(&self, record: &PageRecord) -> PageRecord {
        match SeoPage::try_from(record.clone()) {
            Ok(mut page) => {
                self.apply_meta(&mut page);
                page.into_record()
            }
            Err(err) => {
                log::error!("{}: {err}; returning record unchanged", record.url);
                record.clone()
            }
        }
    }

    pub fn process_pages(&self, records: &[PageRecord]) -> Vec<PageRecord> {
        self.process_pages_with_report(records).0
    }

    pub fn process_pages_with_report(
        &self,
        records: &[PageRecord],
    ) -> (Vec<PageRecord>, PipelineReport) {
        let mut report = PipelineReport::default();
        let mut pages: Vec<SeoPage> = Vec::with_capacity(records.len());
        let mut slots: Vec<Slot> = Vec::with_capacity(records.len());

        for record in records {
            match SeoPage::try_from(record.clone()) {
                Ok(page) => {
                    slots.push(Slot::Page(pages.len()));
                    pages.push(page);
                }
                Err(err) => {
                    log::error!("{}: {err}; returning record unchanged", record.url);
                    report.rejected.insert(record.url.clone(), err.to_string());
                    slots.push(Slot::Rejected(record.clone()));
                }
            }
        }

        report.links = LinkManager::new(self.config).process_link_updates(&mut pages);
        report.content = ContentValidator::new(self.config).validate_pages(&mut pages);
        report.meta = self.meta_stage(&mut pages);
        report.performance = PerformanceOptimizer::new().optimize_pages(&mut pages);

        let monitor = SeoMonitor::new(self.config);
        for page in pages.iter_mut() {
            page.seo_score = Some(score(&monitor.detect_seo_issues(&page.record)));
        }

        log::info!(
            "processed {} pages ({} rejected): links {} failed, content {} failed, meta {} failed",
            pages.len(),
            report.rejected.len(),
            report.links.failed_pages.len(),
            report.content.failed_pages.len(),
            report.meta.failed_pages.len()
        );

        let mut processed: Vec<Option<PageRecord>> = Vec::with_capacity(pages.len());
        for page in pages {
            let (record, analysis) = page.into_parts();
            report.pages.insert(record.url.clone(), analysis);
            processed.push(Some(record));
        }
        let records = slots
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Page(index) => processed.get_mut(index).and_then(Option::take),
                Slot::Rejected(record) => Some(record),
            })
            .collect();

        (records, report)
    }

    fn apply_meta(&self, page: &mut SeoPage) {
        MetaManager::new(self.config).apply(page);
        SchemaBuilder::new(self.config).apply(page);
    }

    fn meta_stage(&self, pages: &mut [SeoPage]) -> BulkUpdateResult {
        let mut result = BulkUpdateResult::default();
        let meta = MetaManager::new(self.config);

        for page in pages.iter_mut() {
            self.apply_meta(page);

            let record = &page.record;
            let keywords = record.target_keywords();
            let mut problems = Vec::new();
            if !meta.is_valid_title(&record.title, &keywords) {
                problems.push(format!("generated title out of rules: {:?}", record.title));
            }
            if !meta.is_valid_description(&record.meta_description, &record.location) {
                problems.push(format!(
                    "generated description out of rules: {:?}",
                    record.meta_description
                ));
            }
            if !meta.is_valid_h1(&record.h1, &record.location, &keywords) {
                problems.push(format!("generated h1 out of rules: {:?}", record.h1));
            }

            if problems.is_empty() {
                result.record_success(page.url());
            } else {
                log::warn!("{}: {}", page.url(), problems.join("; "));
                result.record_failure(page.url(), problems);
            }
        }

        log::info!(
            "meta stage: {} pages updated, {} with unresolved tags",
            result.successful_pages.len(),
            result.failed_pages.len()
        );
        result
    }
}
