//! Configuration module for Doc-Scribe
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every key has a default, so a file may hold only the values that
//! differ from them; command-line options are layered on top by the binary.
//!
//! # Example
//!
//! ```no_run
//! use doc_scribe::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scribe.toml")).unwrap();
//! println!("Per-request timeout: {}s", config.fetch.timeout_seconds);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlConfig, FetchConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, parse_config, read_config, read_config_with_hash,
};
pub use validation::{validate, MAX_DELAY_SECONDS};
