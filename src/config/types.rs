use serde::Deserialize;

/// Main configuration structure for Doc-Scribe
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// What to crawl
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrawlConfig {
    /// Page holding the navigation element; also fixes the scope boundary
    #[serde(rename = "start-url", default)]
    pub start_url: String,

    /// Id (tried first) or class name of the navigation element
    #[serde(default)]
    pub navigation: String,

    /// CSS selector for the main content; the heuristic is used when absent
    #[serde(rename = "main-content-selector", default)]
    pub main_content_selector: Option<String>,
}

/// Request timing and retry budget
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-seconds", default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Lower bound of the random pre-request delay (seconds)
    #[serde(rename = "min-delay-seconds", default = "default_min_delay")]
    pub min_delay_seconds: f64,

    /// Upper bound of the random pre-request delay (seconds)
    #[serde(rename = "max-delay-seconds", default = "default_max_delay")]
    pub max_delay_seconds: f64,

    /// Wall-clock budget for all attempts on one page (seconds)
    #[serde(
        rename = "max-retry-duration-seconds",
        default = "default_max_retry_duration"
    )]
    pub max_retry_duration_seconds: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            min_delay_seconds: default_min_delay(),
            max_delay_seconds: default_max_delay(),
            max_retry_duration_seconds: default_max_retry_duration(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory the Markdown files are written under
    #[serde(rename = "output-dir", default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}

fn default_min_delay() -> f64 {
    1.0
}

fn default_max_delay() -> f64 {
    5.0
}

fn default_max_retry_duration() -> u64 {
    15
}

fn default_crawler_name() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_output_dir() -> String {
    "output_markdowns".to_string()
}
