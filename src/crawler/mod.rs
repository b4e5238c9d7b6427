//! Crawler module for page discovery, fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Navigation container lookup and link extraction
//! - HTTP fetching with randomized delays and deadline-bounded retries
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
pub mod navigation;

pub use coordinator::{ContentSelector, Crawler, Discovery, PageOutcome};
pub use fetcher::{
    build_http_client, DelaySource, FetchPolicy, FetchResult, FetchedPage, Fetcher,
    HttpTransport, JitterDelay, Transport, TransportError,
};
pub use navigation::{base_href, extract_links, find_container, LookupKind, NavigationContainer};

use crate::config::Config;
use crate::output::{CrawlReport, PageSink};
use crate::ScribeError;

/// Runs a complete crawl over HTTP
///
/// This is the main entry point for a run. It will:
/// 1. Fetch the start page and find the navigation container
/// 2. Build the work list of unique in-scope links
/// 3. Fetch, clean and convert each page in order
/// 4. Hand every record to `sink`
///
/// # Arguments
///
/// * `config` - Validated configuration
/// * `sink` - Receives one record per work-list entry
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The run completed, possibly with per-page failures
/// * `Err(ScribeError)` - The start page was unusable
pub async fn crawl<S: PageSink + ?Sized>(
    config: &Config,
    sink: &mut S,
) -> Result<CrawlReport, ScribeError> {
    let mut crawler = Crawler::from_config(config)?;
    crawler.run(sink).await
}
