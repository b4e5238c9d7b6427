//! Run report
//!
//! Counts what happened to each work-list entry and prints an end-of-run
//! summary listing every failed link with its reason.

use crate::output::traits::{PageRecord, PageStatus};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;

/// A link that produced no output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedPage {
    pub url: String,
    pub reason: String,
    pub attempts: u32,
}

/// Summary of one crawl run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// The configured start URL
    pub start_url: String,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Hyperlinks found in the navigation container, duplicates included
    pub links_found: usize,

    /// Unique in-scope links
    pub work_list_size: usize,

    /// Pages converted and accepted by the sink
    pub succeeded: usize,

    /// Successful pages whose content came from the whole-body fallback
    pub body_fallbacks: usize,

    pub failures: Vec<FailedPage>,
}

impl CrawlReport {
    /// Starts a report, stamping the start time
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            started_at: Utc::now(),
            finished_at: None,
            links_found: 0,
            work_list_size: 0,
            succeeded: 0,
            body_fallbacks: 0,
            failures: Vec::new(),
        }
    }

    /// Counts a record the sink accepted
    pub fn record(&mut self, record: &PageRecord) {
        match &record.status {
            PageStatus::Success { region, .. } => {
                self.succeeded += 1;
                if region.is_fallback() {
                    self.body_fallbacks += 1;
                }
            }
            PageStatus::Failed { reason, attempts } => {
                self.record_failure(record.source_url.as_str(), reason.clone(), *attempts);
            }
        }
    }

    pub fn record_failure(&mut self, url: impl Into<String>, reason: impl Into<String>, attempts: u32) {
        self.failures.push(FailedPage {
            url: url.into(),
            reason: reason.into(),
            attempts,
        });
    }

    /// Stamps the finish time
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Records handled so far
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed()
    }

    /// Share of processed links that succeeded, in percent
    pub fn success_rate(&self) -> f64 {
        let processed = self.processed();
        if processed == 0 {
            return 0.0;
        }
        (self.succeeded as f64 / processed as f64) * 100.0
    }

    /// Wall-clock duration, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Formats the summary as plain text
    pub fn format_summary(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "=== Crawl Report ===\n");
        let _ = writeln!(out, "Start URL: {}", self.start_url);
        let _ = writeln!(out, "Started:   {}", self.started_at.to_rfc3339());
        if let Some(finished) = self.finished_at {
            let _ = writeln!(out, "Finished:  {}", finished.to_rfc3339());
        }
        if let Some(duration) = self.duration_seconds() {
            let _ = writeln!(out, "Duration:  {}s", duration);
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "Links:");
        let _ = writeln!(out, "  Found in navigation: {}", self.links_found);
        let _ = writeln!(out, "  Unique in scope: {}", self.work_list_size);
        let _ = writeln!(out);

        let _ = writeln!(out, "Pages:");
        let _ = writeln!(out, "  Converted: {}", self.succeeded);
        let _ = writeln!(out, "  Whole-body fallback: {}", self.body_fallbacks);
        let _ = writeln!(out, "  Failed: {}", self.failed());
        let _ = writeln!(out);

        if !self.failures.is_empty() {
            let _ = writeln!(out, "Failed Links ({}):", self.failures.len());
            for failure in &self.failures {
                let _ = writeln!(
                    out,
                    "  - {} ({} attempts): {}",
                    failure.url, failure.attempts, failure.reason
                );
            }
            let _ = writeln!(out);
        }

        let _ = write!(
            out,
            "Success Rate: {:.1}% ({} / {} pages converted)",
            self.success_rate(),
            self.succeeded,
            self.processed()
        );

        out
    }

    /// Prints the summary to stdout
    pub fn print_summary(&self) {
        println!("{}", self.format_summary());
    }
}
