//! Page records and the sink interface
//!
//! The pipeline hands one [`PageRecord`] per work-list entry to a
//! [`PageSink`]. Sinks decide where records go; the pipeline only supplies
//! the record shape.

use crate::extract::RegionSource;
use crate::url::Link;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot derive an output path for {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Outcome of processing one link
#[derive(Debug, Clone, PartialEq)]
pub enum PageStatus {
    /// The page was converted
    Success {
        markdown: String,
        /// How the content region was chosen
        region: RegionSource,
    },

    /// The page could not be fetched or parsed
    Failed { reason: String, attempts: u32 },
}

/// One processed work-list entry
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    /// The link as it appeared in the work list
    pub source_url: Link,

    /// Visible text of the navigation anchor, if it had any
    pub label: Option<String>,

    pub status: PageStatus,
}

impl PageRecord {
    pub fn success(
        source_url: Link,
        label: Option<String>,
        markdown: String,
        region: RegionSource,
    ) -> Self {
        Self {
            source_url,
            label,
            status: PageStatus::Success { markdown, region },
        }
    }

    pub fn failed(
        source_url: Link,
        label: Option<String>,
        reason: impl Into<String>,
        attempts: u32,
    ) -> Self {
        Self {
            source_url,
            label,
            status: PageStatus::Failed {
                reason: reason.into(),
                attempts,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, PageStatus::Success { .. })
    }

    /// The converted Markdown, for successful records
    pub fn markdown(&self) -> Option<&str> {
        match &self.status {
            PageStatus::Success { markdown, .. } => Some(markdown),
            PageStatus::Failed { .. } => None,
        }
    }
}

/// Consumer of page records
///
/// Records arrive in work-list order, one per link. A sink error for one
/// record does not stop the run; the pipeline logs it and moves on.
pub trait PageSink {
    /// Accepts one record
    fn accept(&mut self, record: &PageRecord) -> OutputResult<()>;

    /// Called once after the last record
    fn finish(&mut self) -> OutputResult<()> {
        Ok(())
    }
}
