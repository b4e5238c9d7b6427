//! Integration tests for the crawl pipeline
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! fetch, clean, locate and convert cycle end-to-end.

use doc_scribe::config::{Config, FetchConfig, UserAgentConfig};
use doc_scribe::crawler::{
    Crawler, FetchPolicy, FetchResult, Fetcher, HttpTransport, TransportError,
};
use doc_scribe::output::{MarkdownDirectorySink, MemorySink, PageStatus};
use doc_scribe::ScribeError;
use std::fs;
use std::time::{Duration, Instant};
use tempfile::tempdir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with no delays and a single attempt per page
fn create_test_config(start_url: String, navigation: &str, output_dir: &str) -> Config {
    let mut config = Config::default();
    config.crawl.start_url = start_url;
    config.crawl.navigation = navigation.to_string();
    config.fetch = FetchConfig {
        timeout_seconds: 5,
        min_delay_seconds: 0.0,
        max_delay_seconds: 0.0,
        max_retry_duration_seconds: 0,
    };
    config.user_agent = UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: Some("https://example.com/contact".to_string()),
    };
    config.output.output_dir = output_dir.to_string();
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<!DOCTYPE html><html><head><title>t</title></head><body>{}</body></html>", body),
        "text/html; charset=utf-8",
    )
}

fn article(title: &str) -> String {
    let paragraphs: String = (1..=3)
        .map(|i| {
            format!(
                "<p>{} paragraph {} describes the feature in enough detail to be worth keeping.</p>",
                title, i
            )
        })
        .collect();
    format!(
        r#"<header><a href="/">Home</a></header>
           <div class="wrapper"><div class="sidebar"><a href="index.html">Back</a></div>
           <article><h2>{}</h2>{}<pre><code class="language-toml">key = "value"</code></pre></article></div>
           <footer>Copyright</footer>"#,
        title, paragraphs
    )
}

const START_PAGE: &str = r#"
    <nav id="sidebar">
        <ul>
            <li><a href="install.html">Install</a></li>
            <li><a href="config.html#options">Configuration</a></li>
            <li><a href="/other/outside.html">Outside</a></li>
            <li><a href="install.html#again">Install</a></li>
        </ul>
    </nav>
    <p>Welcome to the guide.</p>
"#;

#[tokio::test]
async fn test_end_to_end_converts_in_scope_pages_only() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/docs/guide/index.html"))
        .respond_with(html(START_PAGE))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/guide/install.html"))
        .respond_with(html(&article("Install")))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/guide/config.html"))
        .respond_with(html(&article("Configuration")))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Out of scope: must never be requested
    Mock::given(method("GET"))
        .and(path("/other/outside.html"))
        .respond_with(html("<p>nope</p>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let output = tempdir().expect("Failed to create temp dir");
    let config = create_test_config(
        format!("{}/docs/guide/index.html", base_url),
        "sidebar",
        output.path().to_str().unwrap(),
    );

    let mut crawler = Crawler::from_config(&config).expect("Failed to build crawler");
    let mut sink = MarkdownDirectorySink::new(output.path(), crawler.boundary());
    let report = crawler.run(&mut sink).await.expect("Crawl failed");

    assert_eq!(report.links_found, 4);
    assert_eq!(report.work_list_size, 2);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed(), 0);
    assert_eq!(sink.written().len(), 2);

    let install = fs::read_to_string(output.path().join("guide").join("install.md"))
        .expect("install.md missing");
    assert!(install.starts_with("## Install\n\nInstall paragraph 1"));
    assert!(install.contains("```toml\nkey = \"value\"\n```"));
    assert!(!install.contains("Copyright"));
    assert!(!install.contains("Home"));
    assert!(!install.contains("Back"));

    let config_page = fs::read_to_string(output.path().join("guide").join("configuration.md"))
        .expect("configuration.md missing");
    assert!(config_page.starts_with("## Configuration\n"));
}

#[tokio::test]
async fn test_failed_page_does_not_stop_the_run() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/docs/guide/index.html"))
        .respond_with(html(START_PAGE))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/guide/install.html"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/guide/config.html"))
        .respond_with(html(&article("Configuration")))
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        format!("{}/docs/guide/index.html", base_url),
        "sidebar",
        "unused",
    );

    let mut crawler = Crawler::from_config(&config).unwrap();
    let mut sink = MemorySink::new();
    let report = crawler.run(&mut sink).await.unwrap();

    assert_eq!(sink.records().len(), 2);
    assert_eq!(
        sink.records()[0].status,
        PageStatus::Failed {
            reason: "HTTP status 500".to_string(),
            attempts: 1,
        }
    );
    assert!(sink.records()[1].is_success());
    assert_eq!(report.failed(), 1);
    assert_eq!(report.succeeded, 1);
}

#[tokio::test]
async fn test_navigation_by_class_and_redirected_start_page() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/docs/index.html"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("Location", format!("{}/docs/v2/index.html", base_url).as_str()),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/v2/index.html"))
        .respond_with(html(
            r#"<div class="toctree-wrapper menu-left"><a href="usage.html">Usage</a></div>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/v2/usage.html"))
        .respond_with(html(&article("Usage")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        format!("{}/docs/index.html", base_url),
        "toctree-wrapper",
        "unused",
    );

    let mut crawler = Crawler::from_config(&config).unwrap();
    let discovery = crawler.discover().await.unwrap();
    assert_eq!(
        discovery.page_url.as_str(),
        format!("{}/docs/v2/index.html", base_url)
    );

    let mut sink = MemorySink::new();
    let report = crawler.run(&mut sink).await.unwrap();
    assert_eq!(report.succeeded, 1);
    assert_eq!(
        sink.records()[0].source_url.as_str(),
        format!("{}/docs/v2/usage.html", base_url)
    );
}

#[tokio::test]
async fn test_missing_navigation_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/docs/index.html"))
        .respond_with(html("<p>No navigation here</p>"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        format!("{}/docs/index.html", mock_server.uri()),
        "sidebar",
        "unused",
    );

    let mut crawler = Crawler::from_config(&config).unwrap();
    let mut sink = MemorySink::new();
    let err = crawler.run(&mut sink).await.unwrap_err();

    assert!(matches!(err, ScribeError::NavigationNotFound { .. }));
    assert!(sink.records().is_empty());
    assert!(!sink.is_finished());
}

#[tokio::test]
async fn test_unreachable_start_page_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        format!("{}/docs/index.html", mock_server.uri()),
        "sidebar",
        "unused",
    );

    let mut crawler = Crawler::from_config(&config).unwrap();
    let err = crawler.discover().await.unwrap_err();
    assert!(matches!(
        err,
        ScribeError::StartPageUnavailable { attempts: 1, .. }
    ));
}

#[tokio::test]
async fn test_fetcher_retries_until_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page.html"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page.html"))
        .respond_with(html("<p>ok</p>"))
        .with_priority(2)
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::from_config(&UserAgentConfig::default()).unwrap();
    let policy = FetchPolicy {
        timeout: Duration::from_secs(5),
        min_delay: Duration::ZERO,
        max_delay: Duration::ZERO,
        max_retry_duration: Duration::from_secs(10),
    };
    let mut fetcher = Fetcher::new(transport, policy);

    match fetcher.fetch(&format!("{}/page.html", mock_server.uri())).await {
        FetchResult::Success { page, attempts } => {
            assert_eq!(attempts, 3);
            assert_eq!(page.status_code, 200);
            assert!(page.body.contains("ok"));
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetcher_gives_up_after_retry_budget() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::from_config(&UserAgentConfig::default()).unwrap();
    let policy = FetchPolicy {
        timeout: Duration::from_secs(5),
        min_delay: Duration::from_millis(200),
        max_delay: Duration::from_millis(300),
        max_retry_duration: Duration::from_secs(1),
    };
    let mut fetcher = Fetcher::new(transport, policy);

    let started = Instant::now();
    let result = fetcher.fetch(&format!("{}/flaky.html", mock_server.uri())).await;
    let elapsed = started.elapsed();

    match result {
        FetchResult::Failed {
            reason, attempts, ..
        } => {
            assert_eq!(reason, TransportError::Status(503));
            assert!(attempts >= 2, "only {} attempts", attempts);
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_secs(5));
}

#[tokio::test]
async fn test_per_request_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html("<p>slow</p>").set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let transport = HttpTransport::from_config(&UserAgentConfig::default()).unwrap();
    let policy = FetchPolicy {
        timeout: Duration::from_millis(300),
        min_delay: Duration::ZERO,
        max_delay: Duration::ZERO,
        max_retry_duration: Duration::ZERO,
    };
    let mut fetcher = Fetcher::new(transport, policy);

    match fetcher.fetch(&format!("{}/slow.html", mock_server.uri())).await {
        FetchResult::Failed {
            reason, attempts, ..
        } => {
            assert_eq!(reason, TransportError::Timeout);
            assert_eq!(attempts, 1);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_user_agent_header_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/docs/index.html"))
        .and(header(
            "user-agent",
            "TestBot/1.0.0 (+https://example.com/contact)",
        ))
        .respond_with(html(r#"<nav id="toc"><a href="a.html">A</a></nav>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        format!("{}/docs/index.html", mock_server.uri()),
        "toc",
        "unused",
    );

    let mut crawler = Crawler::from_config(&config).unwrap();
    let discovery = crawler.discover().await.unwrap();
    assert_eq!(discovery.work_list.len(), 1);
}
