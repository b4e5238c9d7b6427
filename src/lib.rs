//! Doc-Scribe: documentation site to Markdown
//!
//! This crate crawls the pages listed in a documentation site's navigation
//! element, fetches each one politely, isolates its main content and converts
//! it to Markdown for an output sink.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for Doc-Scribe operations
#[derive(Debug, Error)]
pub enum ScribeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Navigation element with id or class '{selector}' not found on {url}")]
    NavigationNotFound { selector: String, url: String },

    #[error("Start page {url} unavailable after {attempts} attempts: {reason}")]
    StartPageUnavailable {
        url: String,
        reason: String,
        attempts: u32,
    },

    #[error("Failed to fetch {url} after {attempts} attempts: {reason}")]
    FetchFailed {
        url: String,
        reason: String,
        attempts: u32,
    },

    #[error("HTML parse error for {url}: {message}")]
    ParseFailure { url: String, message: String },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

impl ScribeError {
    /// Returns true if the error aborts the whole run rather than a single page
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::FetchFailed { .. } | Self::ParseFailure { .. } | Self::Output(_)
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Doc-Scribe operations
pub type Result<T> = std::result::Result<T, ScribeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use crate::config::Config;
pub use crate::crawler::{crawl, Crawler, FetchPolicy, FetchResult, Fetcher};
pub use crate::extract::{clean, locate, to_markdown, ContentRegion, RegionSource};
pub use crate::output::{CrawlReport, PageRecord, PageSink, PageStatus};
pub use crate::url::{build_work_list, in_scope, normalize, Link, ScopeBoundary, WorkList};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_page_errors_are_not_fatal() {
        let fetch = ScribeError::FetchFailed {
            url: "https://site.test/a.html".to_string(),
            reason: "request timed out".to_string(),
            attempts: 3,
        };
        let parse = ScribeError::ParseFailure {
            url: "https://site.test/b.pdf".to_string(),
            message: "expected HTML, got application/pdf".to_string(),
        };
        let output = ScribeError::from(output::OutputError::InvalidPath(
            "https://site.test/".to_string(),
        ));
        assert!(!fetch.is_fatal());
        assert!(!parse.is_fatal());
        assert!(!output.is_fatal());
        assert_eq!(
            fetch.to_string(),
            "Failed to fetch https://site.test/a.html after 3 attempts: request timed out"
        );
    }

    #[test]
    fn test_run_level_errors_are_fatal() {
        let nav = ScribeError::NavigationNotFound {
            selector: "sidebar".to_string(),
            url: "https://site.test/".to_string(),
        };
        let start = ScribeError::StartPageUnavailable {
            url: "https://site.test/".to_string(),
            reason: "HTTP status 503".to_string(),
            attempts: 4,
        };
        assert!(nav.is_fatal());
        assert!(start.is_fatal());
        assert_eq!(
            nav.to_string(),
            "Navigation element with id or class 'sidebar' not found on https://site.test/"
        );
    }
}
