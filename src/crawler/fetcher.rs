//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests with a per-request timeout
//! - A randomized delay before every attempt
//! - Retrying failures until a wall-clock deadline passes
//!
//! The network and the random source are both behind traits so the retry
//! loop can be driven deterministically in tests.

use crate::config::{FetchConfig, UserAgentConfig};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use url::Url;

/// Maximum redirect hops followed for a single request
const MAX_REDIRECTS: usize = 10;

/// Why a single request failed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("failed to read body: {0}")]
    Body(String),

    #[error("request failed: {0}")]
    Request(String),
}

/// A successful (2xx) response
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,

    /// HTTP status code
    pub status_code: u16,

    /// Content-Type header value, if sent
    pub content_type: Option<String>,

    /// Decoded body
    pub body: String,
}

/// Performs one GET request
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches `url`, giving up after `timeout`
    ///
    /// Non-2xx responses are errors.
    async fn get(&self, url: &str, timeout: Duration) -> Result<FetchedPage, TransportError>;
}

/// Source of the pre-request delays
pub trait DelaySource: Send {
    /// Returns a duration in `[min, max]`
    fn next_delay(&mut self, min: Duration, max: Duration) -> Duration;
}

/// Uniformly random delays from a [`StdRng`]
pub struct JitterDelay {
    rng: StdRng,
}

impl JitterDelay {
    /// Seeds from the operating system's entropy source
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeds deterministically, for reproducible runs
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl DelaySource for JitterDelay {
    fn next_delay(&mut self, min: Duration, max: Duration) -> Duration {
        if max <= min {
            return min;
        }
        let secs = self.rng.gen_range(min.as_secs_f64()..=max.as_secs_f64());
        Duration::try_from_secs_f64(secs).map_or(max, |delay| delay.clamp(min, max))
    }
}

/// Timing parameters for one fetch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchPolicy {
    /// Per-request timeout
    pub timeout: Duration,

    /// Lower bound of the pre-request delay
    pub min_delay: Duration,

    /// Upper bound of the pre-request delay
    pub max_delay: Duration,

    /// Wall-clock budget for all attempts on one URL
    pub max_retry_duration: Duration,
}

impl FetchPolicy {
    /// Builds a policy from validated configuration
    ///
    /// Delays that are negative or not a number become zero; delays too large
    /// for a `Duration` saturate.
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_seconds),
            min_delay: delay_from_secs(config.min_delay_seconds),
            max_delay: delay_from_secs(config.max_delay_seconds),
            max_retry_duration: Duration::from_secs(config.max_retry_duration_seconds),
        }
    }
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

fn delay_from_secs(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// The response
        page: FetchedPage,
        /// Attempts made, including the successful one
        attempts: u32,
    },

    /// Every attempt failed and the retry deadline has passed
    Failed {
        /// The last error seen
        reason: TransportError,
        /// Attempts made
        attempts: u32,
        /// Time spent from the first delay to giving up
        elapsed: Duration,
    },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. } | Self::Failed { attempts, .. } => *attempts,
        }
    }
}

/// Fetches pages with throttling and deadline-bounded retries
pub struct Fetcher<T: Transport> {
    transport: T,
    policy: FetchPolicy,
    delays: Box<dyn DelaySource>,
}

impl<T: Transport> Fetcher<T> {
    /// Creates a fetcher with OS-seeded random delays
    pub fn new(transport: T, policy: FetchPolicy) -> Self {
        Self::with_delay_source(transport, policy, Box::new(JitterDelay::from_entropy()))
    }

    /// Creates a fetcher with an explicit delay source
    pub fn with_delay_source(
        transport: T,
        policy: FetchPolicy,
        delays: Box<dyn DelaySource>,
    ) -> Self {
        Self {
            transport,
            policy,
            delays,
        }
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Fetches a URL, retrying until it succeeds or the deadline passes
    ///
    /// # Retry Loop
    ///
    /// 1. Sleep a random duration in `[min_delay, max_delay]` (every attempt,
    ///    the first included)
    /// 2. GET with the per-request timeout
    /// 3. On 2xx, return the page and the attempt count
    /// 4. On failure, give up if more than `max_retry_duration` has elapsed
    ///    since the fetch began, otherwise go back to 1
    ///
    /// There is no attempt cap; the deadline alone ends the loop. An attempt
    /// that starts inside the budget runs to its full timeout, so the total
    /// time can exceed the budget by at most one delay plus one timeout.
    pub async fn fetch(&mut self, url: &str) -> FetchResult {
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            let delay = self
                .delays
                .next_delay(self.policy.min_delay, self.policy.max_delay);
            if !delay.is_zero() {
                tracing::debug!("Waiting {:.2}s before requesting {}", delay.as_secs_f64(), url);
                tokio::time::sleep(delay).await;
            }

            attempts += 1;
            match self.transport.get(url, self.policy.timeout).await {
                Ok(page) => {
                    if attempts > 1 {
                        tracing::info!("Fetched {} after {} attempts", url, attempts);
                    }
                    return FetchResult::Success { page, attempts };
                }
                Err(error) => {
                    let elapsed = started.elapsed();
                    if elapsed > self.policy.max_retry_duration {
                        tracing::error!(
                            "Giving up on {} after {} attempts in {:.1}s: {}",
                            url,
                            attempts,
                            elapsed.as_secs_f64(),
                            error
                        );
                        return FetchResult::Failed {
                            reason: error,
                            attempts,
                            elapsed,
                        };
                    }

                    tracing::warn!(
                        "Attempt {} for {} failed: {}. Retrying...",
                        attempts,
                        url,
                        error
                    );
                }
            }
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed (up to 10 hops) so the final URL can be used to
/// resolve relative links. Timeouts are applied per request.
///
/// # Example
///
/// ```no_run
/// use doc_scribe::config::UserAgentConfig;
/// use doc_scribe::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`Transport`] backed by a reqwest [`Client`]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the client from user agent configuration
    pub fn from_config(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<FetchedPage, TransportError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // Decodes using the charset from Content-Type, falling back to UTF-8
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Body(e.to_string())
            }
        })?;

        Ok(FetchedPage {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
        })
    }
}

/// Maps a reqwest error onto the transport error taxonomy
fn classify_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else if let Some(status) = error.status() {
        TransportError::Status(status.as_u16())
    } else {
        TransportError::Request(error.to_string())
    }
}
