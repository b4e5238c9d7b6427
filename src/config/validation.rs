use crate::config::types::{Config, CrawlConfig, FetchConfig, OutputConfig, UserAgentConfig};
use crate::url::parse_start_url;
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Longest accepted pre-request delay, in seconds
pub const MAX_DELAY_SECONDS: f64 = 3600.0;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_fetch_config(&config.fetch)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the start URL, navigation identifier and content selector
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.start_url.trim().is_empty() {
        return Err(ConfigError::Validation(
            "start_url cannot be empty".to_string(),
        ));
    }

    parse_start_url(&config.start_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid start URL '{}': {}", config.start_url, e))
    })?;

    if config.navigation.trim().is_empty() {
        return Err(ConfigError::Validation(
            "navigation id or class cannot be empty".to_string(),
        ));
    }

    if let Some(selector) = &config.main_content_selector {
        Selector::parse(selector).map_err(|e| {
            ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e))
        })?;
    }

    Ok(())
}

/// Validates timeout, delay bounds and retry budget
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_seconds == 0 {
        return Err(ConfigError::Validation(
            "timeout_seconds must be >= 1".to_string(),
        ));
    }

    if !config.min_delay_seconds.is_finite() || config.min_delay_seconds < 0.0 {
        return Err(ConfigError::Validation(format!(
            "min_delay_seconds must be a non-negative number, got {}",
            config.min_delay_seconds
        )));
    }

    if !config.max_delay_seconds.is_finite() || config.max_delay_seconds < 0.0 {
        return Err(ConfigError::Validation(format!(
            "max_delay_seconds must be a non-negative number, got {}",
            config.max_delay_seconds
        )));
    }

    if config.max_delay_seconds > MAX_DELAY_SECONDS {
        return Err(ConfigError::Validation(format!(
            "max_delay_seconds must be at most {}, got {}",
            MAX_DELAY_SECONDS, config.max_delay_seconds
        )));
    }

    if config.min_delay_seconds > config.max_delay_seconds {
        return Err(ConfigError::Validation(format!(
            "min_delay_seconds ({}) must not exceed max_delay_seconds ({})",
            config.min_delay_seconds, config.max_delay_seconds
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.output_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_valid_config() -> Config {
        let mut config = Config::default();
        config.crawl.start_url = "https://docs.example.com/guide/install.html".to_string();
        config.crawl.navigation = "sidebar".to_string();
        config
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&create_valid_config()).is_ok());
    }

    #[test]
    fn test_empty_start_url() {
        let mut config = create_valid_config();
        config.crawl.start_url = String::new();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_start_url_must_be_http() {
        let mut config = create_valid_config();
        config.crawl.start_url = "ftp://docs.example.com/".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_start_url_must_be_absolute() {
        let mut config = create_valid_config();
        config.crawl.start_url = "docs/index.html".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_empty_navigation() {
        let mut config = create_valid_config();
        config.crawl.navigation = "  ".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_invalid_selector() {
        let mut config = create_valid_config();
        config.crawl.main_content_selector = Some("div[[".to_string());
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_valid_selector() {
        let mut config = create_valid_config();
        config.crawl.main_content_selector = Some("main article.content".to_string());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_timeout() {
        let mut config = create_valid_config();
        config.fetch.timeout_seconds = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_min_delay_above_max_delay() {
        let mut config = create_valid_config();
        config.fetch.min_delay_seconds = 6.0;
        config.fetch.max_delay_seconds = 5.0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_equal_delays_allowed() {
        let mut config = create_valid_config();
        config.fetch.min_delay_seconds = 0.0;
        config.fetch.max_delay_seconds = 0.0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_negative_delay() {
        let mut config = create_valid_config();
        config.fetch.min_delay_seconds = -1.0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_nan_delay() {
        let mut config = create_valid_config();
        config.fetch.max_delay_seconds = f64::NAN;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_huge_delay_rejected() {
        let mut config = create_valid_config();
        config.fetch.min_delay_seconds = 1e30;
        config.fetch.max_delay_seconds = 1e30;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));

        config.fetch.min_delay_seconds = 0.0;
        config.fetch.max_delay_seconds = MAX_DELAY_SECONDS;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_crawler_name() {
        let mut config = create_valid_config();
        config.user_agent.crawler_name = "bad name!".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_invalid_contact_url() {
        let mut config = create_valid_config();
        config.user_agent.contact_url = Some("not a url".to_string());
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_empty_output_dir() {
        let mut config = create_valid_config();
        config.output.output_dir = String::new();
        assert!(validate(&config).is_err());
    }
}
