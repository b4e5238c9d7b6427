//! Output module for converted pages and run reports
//!
//! This module handles:
//! - The record shape handed from the pipeline to a sink
//! - Writing Markdown files that mirror the site's directory layout
//! - Collecting records in memory
//! - Summarizing a run

mod files;
mod memory;
pub mod stats;
mod traits;

pub use files::{file_stem, MarkdownDirectorySink, UNTITLED_STEM};
pub use memory::MemorySink;
pub use stats::{CrawlReport, FailedPage};
pub use traits::{OutputError, OutputResult, PageRecord, PageSink, PageStatus};
