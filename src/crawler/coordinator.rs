//! Crawler coordinator - main crawl orchestration logic
//!
//! This module drives the pipeline for one run:
//! - Fetching the start page and locating its navigation container
//! - Building the work list from the container's links
//! - Fetching, cleaning, locating and converting each listed page in order
//! - Handing one record per link to the sink and tallying the report
//!
//! Pages are processed strictly one after another. The fetcher's random
//! delay before each request is the only throttle.

use crate::config::Config;
use crate::crawler::fetcher::{
    FetchPolicy, FetchResult, FetchedPage, Fetcher, HttpTransport, Transport,
};
use crate::crawler::navigation::{base_href, extract_links, find_container, LookupKind};
use crate::extract::{clean, locate, to_markdown, RegionSource};
use crate::output::{CrawlReport, PageRecord, PageSink};
use crate::url::{build_work_list, parse_start_url, ScopeBoundary, WorkItem, WorkList};
use crate::{ConfigError, ScribeError};
use scraper::{Html, Selector};
use url::Url;

/// An explicit main-content selector, kept with its source text for logging
#[derive(Debug, Clone)]
pub struct ContentSelector {
    text: String,
    selector: Selector,
}

impl ContentSelector {
    /// Parses a CSS selector
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let selector = Selector::parse(text)
            .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", text, e)))?;
        Ok(Self {
            text: text.to_string(),
            selector,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// What the start page yielded
#[derive(Debug, Clone)]
pub struct Discovery {
    /// The start page's URL after redirects
    pub page_url: Url,

    /// How the navigation container was found
    pub matched_by: LookupKind,

    /// Hyperlinks in the container, duplicates and out-of-scope links included
    pub links_found: usize,

    pub work_list: WorkList,
}

/// The record produced for one work item, with the fetch attempts it took
#[derive(Debug, Clone)]
pub struct PageOutcome {
    pub record: PageRecord,
    pub attempts: u32,
}

/// Main crawler coordinator structure
pub struct Crawler<T: Transport> {
    start_url: Url,
    navigation: String,
    content_selector: Option<ContentSelector>,
    boundary: ScopeBoundary,
    fetcher: Fetcher<T>,
}

impl Crawler<HttpTransport> {
    /// Builds a crawler that talks HTTP, from validated configuration
    pub fn from_config(config: &Config) -> Result<Self, ScribeError> {
        let start_url = parse_start_url(&config.crawl.start_url)?;
        let transport = HttpTransport::from_config(&config.user_agent)?;
        let fetcher = Fetcher::new(transport, FetchPolicy::from_config(&config.fetch));
        let content_selector = config
            .crawl
            .main_content_selector
            .as_deref()
            .map(ContentSelector::parse)
            .transpose()?;

        Ok(Self::new(start_url, config.crawl.navigation.as_str(), fetcher)
            .with_content_selector(content_selector))
    }
}

impl<T: Transport> Crawler<T> {
    /// Creates a crawler for `start_url`, reading links from the element
    /// whose id or class is `navigation`
    pub fn new(start_url: Url, navigation: impl Into<String>, fetcher: Fetcher<T>) -> Self {
        let boundary = ScopeBoundary::from_start_url(&start_url);
        Self {
            start_url,
            navigation: navigation.into(),
            content_selector: None,
            boundary,
            fetcher,
        }
    }

    /// Sets the selector tried before the content heuristic
    pub fn with_content_selector(mut self, selector: Option<ContentSelector>) -> Self {
        self.content_selector = selector;
        self
    }

    pub fn start_url(&self) -> &Url {
        &self.start_url
    }

    pub fn boundary(&self) -> &ScopeBoundary {
        &self.boundary
    }

    /// Fetches the start page and builds the work list
    ///
    /// # Returns
    ///
    /// * `Ok(Discovery)` - The work list, possibly empty
    /// * `Err(ScribeError::StartPageUnavailable)` - The start page could not
    ///   be fetched within its retry budget
    /// * `Err(ScribeError::NavigationNotFound)` - Neither an id nor a class
    ///   lookup found the navigation element
    pub async fn discover(&mut self) -> Result<Discovery, ScribeError> {
        let url = self.start_url.to_string();
        tracing::info!("Fetching start page {}", url);

        let page = match self.fetcher.fetch(&url).await {
            FetchResult::Success { page, .. } => page,
            FetchResult::Failed {
                reason, attempts, ..
            } => {
                return Err(ScribeError::StartPageUnavailable {
                    url,
                    reason: reason.to_string(),
                    attempts,
                });
            }
        };

        let (raw_links, base, matched_by) = {
            let document = Html::parse_document(&page.body);
            let container =
                find_container(&document, &self.navigation, page.final_url.as_str())?;
            tracing::info!(
                "Found navigation container by {}: '{}'",
                container.matched_by,
                self.navigation
            );

            let base = resolve_base(&document, &page.final_url);
            (extract_links(&container), base, container.matched_by)
        };

        tracing::info!("Found {} links in the navigation container", raw_links.len());
        let work_list = build_work_list(&raw_links, &base, &self.boundary);
        tracing::info!(
            "{} unique links within {}",
            work_list.len(),
            self.boundary.as_str()
        );
        if work_list.is_empty() {
            tracing::warn!("No in-scope links found; nothing to fetch");
        }

        Ok(Discovery {
            page_url: page.final_url,
            matched_by,
            links_found: raw_links.len(),
            work_list,
        })
    }

    /// Fetches and converts one work item
    ///
    /// Never fails: fetch and parse problems become a failed record.
    pub async fn process(&mut self, item: &WorkItem) -> PageOutcome {
        let url = item.link.as_str();

        match self.fetcher.fetch(url).await {
            FetchResult::Success { page, attempts } => {
                let record = match self.convert(&page) {
                    Ok((markdown, region)) => {
                        tracing::info!("Converted {}", url);
                        PageRecord::success(item.link.clone(), item.label.clone(), markdown, region)
                    }
                    Err(e) => {
                        tracing::error!("{}", e);
                        PageRecord::failed(item.link.clone(), item.label.clone(), e.to_string(), attempts)
                    }
                };
                PageOutcome { record, attempts }
            }
            FetchResult::Failed {
                reason, attempts, ..
            } => {
                let error = ScribeError::FetchFailed {
                    url: url.to_string(),
                    reason: reason.to_string(),
                    attempts,
                };
                tracing::error!("{}", error);
                PageOutcome {
                    record: PageRecord::failed(
                        item.link.clone(),
                        item.label.clone(),
                        reason.to_string(),
                        attempts,
                    ),
                    attempts,
                }
            }
        }
    }

    /// Runs the whole pipeline, handing every record to `sink`
    ///
    /// Only start-page problems abort the run. Per-link failures, including
    /// sink errors, are logged and listed in the returned report.
    pub async fn run<S: PageSink + ?Sized>(
        &mut self,
        sink: &mut S,
    ) -> Result<CrawlReport, ScribeError> {
        let mut report = CrawlReport::new(self.start_url.as_str());

        let discovery = self.discover().await?;
        report.links_found = discovery.links_found;
        report.work_list_size = discovery.work_list.len();

        let total = discovery.work_list.len();
        for (index, item) in discovery.work_list.iter().enumerate() {
            tracing::info!("[{}/{}] Processing {}", index + 1, total, item.link);

            let outcome = self.process(item).await;
            match sink.accept(&outcome.record).map_err(ScribeError::from) {
                Ok(()) => report.record(&outcome.record),
                Err(e) => {
                    tracing::error!("Failed to save {}: {}", item.link, e);
                    report.record_failure(item.link.as_str(), e.to_string(), outcome.attempts);
                }
            }
        }

        if let Err(e) = sink.finish().map_err(ScribeError::from) {
            tracing::error!("Failed to finish output: {}", e);
        }

        report.finish();
        tracing::info!(
            "Crawl completed: {} converted, {} failed",
            report.succeeded,
            report.failed()
        );

        Ok(report)
    }

    /// Cleans, locates and converts a fetched page
    fn convert(&self, page: &FetchedPage) -> Result<(String, RegionSource), ScribeError> {
        check_html(page)?;

        let mut document = Html::parse_document(&page.body);
        let base = resolve_base(&document, &page.final_url);
        clean(&mut document);

        let selector = self.content_selector.as_ref();
        let region = locate(&document, selector.map(|s| &s.selector));

        if let Some(selector) = selector {
            if region.source != RegionSource::Selector {
                tracing::warn!(
                    "Main content selector '{}' matched nothing on {}; using heuristic",
                    selector.as_str(),
                    page.final_url
                );
            }
        }
        match region.source {
            RegionSource::Heuristic { score } => {
                tracing::debug!(
                    "Heuristic picked <{}> with score {:.1} on {}",
                    region.element.value().name(),
                    score,
                    page.final_url
                );
            }
            RegionSource::BodyFallback => {
                tracing::warn!(
                    "No content region scored high enough on {}; using the whole body",
                    page.final_url
                );
            }
            RegionSource::Selector => {}
        }

        Ok((to_markdown(region.element, &base), region.source))
    }
}

/// Rejects payloads that cannot be HTML documents
fn check_html(page: &FetchedPage) -> Result<(), ScribeError> {
    if let Some(content_type) = &page.content_type {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !mime.is_empty() && !mime.contains("html") {
            return Err(ScribeError::ParseFailure {
                url: page.final_url.to_string(),
                message: format!("expected HTML, got {}", mime),
            });
        }
    }

    if page.body.trim().is_empty() {
        return Err(ScribeError::ParseFailure {
            url: page.final_url.to_string(),
            message: "empty response body".to_string(),
        });
    }

    Ok(())
}

/// The URL relative links resolve against: `<base href>` if set, else the page URL
fn resolve_base(document: &Html, page_url: &Url) -> Url {
    base_href(document)
        .and_then(|href| page_url.join(&href).ok())
        .unwrap_or_else(|| page_url.clone())
}
