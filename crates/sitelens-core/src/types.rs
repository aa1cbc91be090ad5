//! Common types used across sitelens

use crate::error::{Result, SeoError};
use crate::url_utils::page_path;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Paths rendered as plain informational pages
const STATIC_SEGMENTS: &[&str] = &["about", "contact", "privacy", "terms", "faq", "gallery"];

/// What a route renders, which drives sitemap priority and schema choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageKind {
    Home,
    /// Primary page for one service across all locations
    Category,
    /// One service in one location
    ServiceLocation,
    BlogIndex,
    Blog,
    Static,
}

impl PageKind {
    /// Infer the kind from the url pattern when a record does not carry one
    pub fn infer(url: &str, location: &str) -> Self {
        let path = page_path(url).unwrap_or_else(|| url.to_string());
        let trimmed = path.trim_end_matches('/');

        if trimmed.is_empty() {
            return PageKind::Home;
        }
        if trimmed == "/blog" {
            return PageKind::BlogIndex;
        }
        if trimmed.starts_with("/blog/") {
            return PageKind::Blog;
        }
        let last_segment = trimmed.rsplit('/').next().unwrap_or_default();
        if STATIC_SEGMENTS.contains(&last_segment) {
            return PageKind::Static;
        }
        if location.trim().is_empty() {
            PageKind::Category
        } else {
            PageKind::ServiceLocation
        }
    }

    /// Pages that offer a service and carry `Service` JSON-LD
    pub fn is_service(self) -> bool {
        matches!(self, PageKind::Category | PageKind::ServiceLocation)
    }
}

/// A link shown in a page's "related services" block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedService {
    pub name: String,
    pub url: String,
}

/// JSON-LD objects embedded in a page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_business: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<JsonValue>,
}

impl PageSchema {
    /// All present blocks, LocalBusiness first
    pub fn blocks(&self) -> Vec<JsonValue> {
        self.local_business
            .iter()
            .chain(self.service.iter())
            .cloned()
            .collect()
    }
}

/// One generated route's SEO-relevant data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<PageKind>,
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub location: String,
    /// Target keywords, primary first
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub meta_description: String,
    #[serde(default)]
    pub h1: String,
    #[serde(default)]
    pub canonical_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Rendered body HTML
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<NaiveDate>,
    #[serde(default)]
    pub related_services: Vec<RelatedService>,
    #[serde(default)]
    pub schema: PageSchema,
    #[serde(default)]
    pub open_graph: BTreeMap<String, String>,
    #[serde(default)]
    pub twitter: BTreeMap<String, String>,
}

impl PageRecord {
    pub fn new(
        url: impl Into<String>,
        service_name: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            service_name: service_name.into(),
            location: location.into(),
            ..Default::default()
        }
    }

    /// Explicit kind, or the one implied by the url pattern
    pub fn kind(&self) -> PageKind {
        self.kind
            .unwrap_or_else(|| PageKind::infer(&self.url, &self.location))
    }

    /// Keywords to target; falls back to the service name, then the title
    pub fn target_keywords(&self) -> Vec<String> {
        let explicit: Vec<String> = self
            .keywords
            .iter()
            .map(|keyword| keyword.trim())
            .filter(|keyword| !keyword.is_empty())
            .map(str::to_string)
            .collect();
        if !explicit.is_empty() {
            return explicit;
        }
        [&self.service_name, &self.title]
            .into_iter()
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
            .map(|value| vec![value.to_string()])
            .unwrap_or_default()
    }

    /// Anchor text other pages use when linking here
    pub fn link_name(&self) -> String {
        match self.kind() {
            PageKind::ServiceLocation if !self.location.is_empty() => {
                format!("{} in {}", self.service_name, self.location)
            }
            PageKind::Category if !self.service_name.is_empty() => self.service_name.clone(),
            _ if !self.title.is_empty() => self.title.clone(),
            _ if !self.service_name.is_empty() => self.service_name.clone(),
            _ => self.url.clone(),
        }
    }
}

/// How an outgoing link was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    /// Selected into the related-services block
    Related,
    /// Internal `<a href>` found in the body content
    Contextual,
    /// Body link to another host
    External,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingLink {
    pub source_url: String,
    pub target_url: String,
    pub anchor_text: String,
    pub link_type: LinkType,
    pub is_no_follow: bool,
    pub context: String,
}

/// Loading hints for a page's images
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceHints {
    /// Above-the-fold image worth preloading
    pub preload: Option<String>,
    pub lazy_load: Vec<String>,
    /// Original source → suggested WebP variant
    pub webp_alternatives: BTreeMap<String, String>,
}

/// What a processing pass learned about one page beyond its record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAnalysis {
    pub word_count: usize,
    pub outgoing_links: Vec<OutgoingLink>,
    pub performance: PerformanceHints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_score: Option<u8>,
}

/// Internal working representation used during a processing pass
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoPage {
    #[serde(flatten)]
    pub record: PageRecord,
    /// Site-relative path of `record.url`
    pub path: String,
    pub word_count: usize,
    pub outgoing_links: Vec<OutgoingLink>,
    pub structured_data: Vec<JsonValue>,
    pub performance: PerformanceHints,
    pub seo_score: Option<u8>,
}

impl SeoPage {
    pub fn url(&self) -> &str {
        &self.record.url
    }

    pub fn kind(&self) -> PageKind {
        self.record.kind()
    }

    /// Convert back to the external shape
    pub fn into_record(self) -> PageRecord {
        self.record
    }

    /// Split into the record and the data computed for it
    pub fn into_parts(self) -> (PageRecord, PageAnalysis) {
        let analysis = PageAnalysis {
            word_count: self.word_count,
            outgoing_links: self.outgoing_links,
            performance: self.performance,
            seo_score: self.seo_score,
        };
        (self.record, analysis)
    }
}

impl TryFrom<PageRecord> for SeoPage {
    type Error = SeoError;

    fn try_from(record: PageRecord) -> Result<Self> {
        let path =
            page_path(&record.url).ok_or_else(|| SeoError::InvalidPageUrl(record.url.clone()))?;
        let structured_data = record.schema.blocks();
        Ok(Self {
            record,
            path,
            word_count: 0,
            outgoing_links: Vec::new(),
            structured_data,
            performance: PerformanceHints::default(),
            seo_score: None,
        })
    }
}

/// Issue severity, ordered from least to most serious
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Missing optional data
    Info,
    /// Out-of-range values and rule violations
    Warning,
    /// Missing required data
    Critical,
}

impl Severity {
    /// Points deducted from a page's 100-point score
    pub fn deduction(self) -> u32 {
        match self {
            Severity::Critical => 20,
            Severity::Warning => 5,
            Severity::Info => 1,
        }
    }
}

/// Category of an SEO issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingField,
    LengthOutOfRange,
    KeywordMissing,
    CanonicalMismatch,
    LinkCount,
    InvalidLink,
    Content,
    Schema,
    DuplicateUrl,
    MissingOptional,
}

/// A problem found on one page during a monitoring run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoIssue {
    pub page_url: String,
    pub severity: Severity,
    pub kind: IssueKind,
    pub message: String,
}

impl SeoIssue {
    pub fn new(
        page_url: impl Into<String>,
        severity: Severity,
        kind: IssueKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            page_url: page_url.into(),
            severity,
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of one validation rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationCheck {
    pub name: String,
    pub passed: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl ValidationCheck {
    pub fn new(name: &str, passed: bool, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: JsonValue) -> Self {
        self.details = Some(details);
        self
    }
}

/// Per-page outcome of a bulk operation; one page's failure never stops the rest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateResult {
    pub successful_pages: Vec<String>,
    pub failed_pages: Vec<String>,
    pub errors: BTreeMap<String, Vec<String>>,
}

impl BulkUpdateResult {
    pub fn record_success(&mut self, url: &str) {
        self.successful_pages.push(url.to_string());
    }

    pub fn record_failure(&mut self, url: &str, messages: Vec<String>) {
        self.failed_pages.push(url.to_string());
        self.errors.entry(url.to_string()).or_default().extend(messages);
    }

    pub fn is_clean(&self) -> bool {
        self.failed_pages.is_empty()
    }
}

/// Sitemap change-frequency tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeFreq::Always => "always",
            ChangeFreq::Hourly => "hourly",
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
            ChangeFreq::Yearly => "yearly",
            ChangeFreq::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeFreq {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "always" => Ok(ChangeFreq::Always),
            "hourly" => Ok(ChangeFreq::Hourly),
            "daily" => Ok(ChangeFreq::Daily),
            "weekly" => Ok(ChangeFreq::Weekly),
            "monthly" => Ok(ChangeFreq::Monthly),
            "yearly" => Ok(ChangeFreq::Yearly),
            "never" => Ok(ChangeFreq::Never),
            other => Err(format!("unknown changefreq: {other}")),
        }
    }
}

/// One `<url>` of the sitemap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapEntry {
    pub url: String,
    pub last_modified: Option<NaiveDate>,
    pub priority: f32,
    pub change_freq: ChangeFreq,
}
