//! Doc-Scribe main entry point
//!
//! This is the command-line interface for the Doc-Scribe documentation
//! converter.

use anyhow::Context;
use clap::Parser;
use doc_scribe::config::{read_config_with_hash, validate, Config};
use doc_scribe::crawler::Crawler;
use doc_scribe::output::MarkdownDirectorySink;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Doc-Scribe: documentation pages to Markdown
///
/// Reads the links listed in a documentation page's navigation element,
/// fetches every linked page under the start page's directory and saves
/// its main content as Markdown, mirroring the site's directory layout.
#[derive(Parser, Debug)]
#[command(name = "doc-scribe")]
#[command(version)]
#[command(about = "Convert a documentation site's pages to Markdown", long_about = None)]
struct Cli {
    /// URL of the page holding the navigation element
    #[arg(value_name = "START_URL")]
    start_url: Option<String>,

    /// Id or class name of the element containing the navigation links
    #[arg(value_name = "LINK_SOURCE")]
    link_source: Option<String>,

    /// CSS selector for the main content area (heuristic detection if omitted)
    #[arg(long, value_name = "SELECTOR")]
    main_content_selector: Option<String>,

    /// Directory to save the Markdown files in
    #[arg(long, value_name = "DIR")]
    output_dir: Option<String>,

    /// Timeout for each HTTP request, in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Minimum random delay before each request, in seconds
    #[arg(long, value_name = "SECONDS")]
    min_delay: Option<f64>,

    /// Maximum random delay before each request, in seconds
    #[arg(long, value_name = "SECONDS")]
    max_delay: Option<f64>,

    /// Time budget for retrying one page, in seconds
    #[arg(long, value_name = "SECONDS")]
    max_retry_duration: Option<u64>,

    /// Path to a TOML configuration file; command-line values override it
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Fetch only the start page and list the pages that would be converted
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config).await
    } else {
        handle_crawl(&config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("doc_scribe=info,warn"),
            1 => EnvFilter::new("doc_scribe=debug,info"),
            2 => EnvFilter::new("doc_scribe=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the optional config file, applies command-line overrides and validates
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = read_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    apply_overrides(&mut config, cli);
    validate(&config).context("Invalid configuration")?;

    Ok(config)
}

/// Layers command-line values over the file configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(start_url) = &cli.start_url {
        config.crawl.start_url = start_url.clone();
    }
    if let Some(link_source) = &cli.link_source {
        config.crawl.navigation = link_source.clone();
    }
    if let Some(selector) = &cli.main_content_selector {
        config.crawl.main_content_selector = Some(selector.clone());
    }
    if let Some(output_dir) = &cli.output_dir {
        config.output.output_dir = output_dir.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.fetch.timeout_seconds = timeout;
    }
    if let Some(min_delay) = cli.min_delay {
        config.fetch.min_delay_seconds = min_delay;
    }
    if let Some(max_delay) = cli.max_delay {
        config.fetch.max_delay_seconds = max_delay;
    }
    if let Some(max_retry_duration) = cli.max_retry_duration {
        config.fetch.max_retry_duration_seconds = max_retry_duration;
    }
}

/// Handles the --dry-run mode: shows what would be converted
async fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let mut crawler = Crawler::from_config(config)?;
    let discovery = crawler.discover().await?;

    println!("=== Doc-Scribe Dry Run ===\n");
    println!("Start page: {}", discovery.page_url);
    println!(
        "Navigation: '{}' (found by {})",
        config.crawl.navigation, discovery.matched_by
    );
    println!("Scope: {}", crawler.boundary().as_str());
    println!("Links in navigation: {}", discovery.links_found);

    println!("\nPages ({}):", discovery.work_list.len());
    for item in &discovery.work_list {
        match &item.label {
            Some(label) => println!("  - {} ({})", item.link, label),
            None => println!("  - {}", item.link),
        }
    }

    println!(
        "\n✓ Would convert {} pages into {}",
        discovery.work_list.len(),
        config.output.output_dir
    );

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling from {} using navigation '{}'",
        config.crawl.start_url,
        config.crawl.navigation
    );

    let mut crawler = Crawler::from_config(config)?;
    let mut sink = MarkdownDirectorySink::new(&config.output.output_dir, crawler.boundary());

    match crawler.run(&mut sink).await {
        Ok(report) => {
            report.print_summary();
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
