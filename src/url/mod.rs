//! URL handling module for Doc-Scribe
//!
//! This module provides link normalization, the crawl's scope boundary and
//! construction of the ordered, de-duplicated work list.

mod normalize;
mod scope;

use crate::UrlError;
use std::fmt;
use url::Url;

// Re-export main functions
pub use normalize::normalize;
pub use scope::{build_work_list, in_scope, RawLink, ScopeBoundary, WorkItem, WorkList};

/// An absolute, fragment-free URL
///
/// Two links are the same page iff their strings are byte-equal. Links are
/// only ever produced by [`normalize`], so every comparison happens on the
/// same canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Link(String);

impl Link {
    /// Returns the link as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the link back into a [`Url`]
    ///
    /// Always succeeds for links built by [`normalize`].
    pub fn to_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.0)
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Link {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Parses and checks a crawl start URL
///
/// The start URL must be absolute, use HTTP or HTTPS and carry a host.
///
/// # Examples
///
/// ```
/// use doc_scribe::url::parse_start_url;
///
/// let url = parse_start_url("https://docs.example.com/guide/index.html").unwrap();
/// assert_eq!(url.host_str(), Some("docs.example.com"));
/// assert!(parse_start_url("ftp://example.com/").is_err());
/// ```
pub fn parse_start_url(input: &str) -> Result<Url, UrlError> {
    let url = Url::parse(input.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}
