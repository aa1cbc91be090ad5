//! Error types for sitelens-core.
//!
//! Validation findings are never errors; they are reported as
//! [`ValidationCheck`](crate::types::ValidationCheck) and
//! [`SeoIssue`](crate::types::SeoIssue) values. The types here cover the
//! failures that stop a single unit of work: a malformed page record, a bad
//! configuration file, or a catalog that cannot be built.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while processing a single page.
#[derive(Debug, Error)]
pub enum SeoError {
    /// The page url is neither a site path nor an absolute http(s) url
    #[error("invalid page url: {0:?}")]
    InvalidPageUrl(String),
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for `{field}`: {message}")]
    Invalid { field: &'static str, message: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Errors raised while building a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Two generated pages share the same url
    #[error("duplicate page url generated: {0}")]
    DuplicateUrl(String),

    /// A blog post references a slug with no registered loader
    #[error("no content loader registered for blog slug `{0}`")]
    UnknownBlogSlug(String),

    /// A registered loader failed to produce the post body
    #[error("failed to load blog post `{slug}`: {source}")]
    LoaderFailed {
        slug: String,
        #[source]
        source: anyhow::Error,
    },

    /// A service or location has an empty name or slug
    #[error("{0}")]
    InvalidEntry(String),
}

/// Result type alias using SeoError.
pub type Result<T> = std::result::Result<T, SeoError>;
