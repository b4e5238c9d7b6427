//! Crawl scope and work list construction

use crate::url::{normalize, Link};
use std::collections::HashSet;
use url::Url;

/// The directory prefix every crawled link must start with
///
/// Derived once from the start URL by dropping its final path segment
/// (plus query and fragment). The prefix always ends with `/`, so a start
/// URL that already names a directory is its own boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeBoundary {
    prefix: String,
    path: String,
}

impl ScopeBoundary {
    /// Derives the boundary from the crawl's start URL
    ///
    /// # Examples
    ///
    /// ```
    /// use doc_scribe::url::ScopeBoundary;
    /// use url::Url;
    ///
    /// let start = Url::parse("https://site.test/docs/guide/install.html").unwrap();
    /// let boundary = ScopeBoundary::from_start_url(&start);
    /// assert_eq!(boundary.as_str(), "https://site.test/docs/guide/");
    /// ```
    pub fn from_start_url(start_url: &Url) -> Self {
        let mut url = start_url.clone();
        url.set_fragment(None);
        url.set_query(None);

        let path = url.path();
        let directory = match path.rfind('/') {
            Some(idx) => path[..=idx].to_string(),
            None => "/".to_string(),
        };
        url.set_path(&directory);

        Self {
            prefix: url.to_string(),
            path: url.path().to_string(),
        }
    }

    /// The boundary as a URL prefix string
    pub fn as_str(&self) -> &str {
        &self.prefix
    }

    /// The boundary's directory path, always ending in `/`
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns true if `link` lies under this boundary
    pub fn contains(&self, link: &Link) -> bool {
        link.as_str().starts_with(&self.prefix)
    }
}

/// Returns true iff `link` starts with the boundary's prefix
pub fn in_scope(link: &Link, boundary: &ScopeBoundary) -> bool {
    boundary.contains(link)
}

/// A hyperlink as found in the navigation container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLink {
    /// The href attribute, untouched
    pub href: String,

    /// Visible anchor text, whitespace collapsed (may be empty)
    pub text: String,
}

impl RawLink {
    pub fn new(href: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            text: text.into(),
        }
    }
}

/// A unique in-scope link queued for processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// The normalized link
    pub link: Link,

    /// Anchor text of the first occurrence, if it had any
    pub label: Option<String>,
}

/// Ordered, duplicate-free sequence of links to process
///
/// Order is first-seen order from navigation extraction. Built once by
/// [`build_work_list`] and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkList {
    items: Vec<WorkItem>,
}

impl WorkList {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WorkItem> {
        self.items.iter()
    }

    /// The links in work order
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.items.iter().map(|item| &item.link)
    }
}

impl<'a> IntoIterator for &'a WorkList {
    type Item = &'a WorkItem;
    type IntoIter = std::slice::Iter<'a, WorkItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Builds the work list from raw navigation links
///
/// Each href is normalized against `base` (fragment stripped), dropped if it
/// falls outside `boundary`, and kept only on its first occurrence.
///
/// # Arguments
///
/// * `raw_links` - Links in document order, duplicates included
/// * `base` - Base URL of the page the links came from
/// * `boundary` - The crawl's scope boundary
pub fn build_work_list(raw_links: &[RawLink], base: &Url, boundary: &ScopeBoundary) -> WorkList {
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for raw in raw_links {
        let Some(link) = normalize(&raw.href, base) else {
            tracing::debug!("Skipping unresolvable href: {}", raw.href);
            continue;
        };

        if !boundary.contains(&link) {
            tracing::debug!("Skipping out-of-scope link: {}", link);
            continue;
        }

        if !seen.insert(link.clone()) {
            continue;
        }

        let label = Some(raw.text.trim().to_string()).filter(|text| !text.is_empty());
        items.push(WorkItem { link, label });
    }

    WorkList { items }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start_url() -> Url {
        Url::parse("https://site.test/docs/guide/install.html").unwrap()
    }

    fn boundary() -> ScopeBoundary {
        ScopeBoundary::from_start_url(&start_url())
    }

    fn raw(href: &str) -> RawLink {
        RawLink::new(href, "")
    }

    #[test]
    fn test_boundary_strips_last_segment() {
        assert_eq!(boundary().as_str(), "https://site.test/docs/guide/");
        assert_eq!(boundary().path(), "/docs/guide/");
    }

    #[test]
    fn test_boundary_of_directory_is_itself() {
        let start = Url::parse("https://site.test/docs/guide/").unwrap();
        let boundary = ScopeBoundary::from_start_url(&start);
        assert_eq!(boundary.as_str(), start.as_str());
    }

    #[test]
    fn test_boundary_of_root() {
        let start = Url::parse("https://site.test").unwrap();
        let boundary = ScopeBoundary::from_start_url(&start);
        assert_eq!(boundary.as_str(), "https://site.test/");
        assert_eq!(boundary.path(), "/");
    }

    #[test]
    fn test_boundary_drops_query_and_fragment() {
        let start = Url::parse("https://site.test/docs/index.html?v=2#intro").unwrap();
        let boundary = ScopeBoundary::from_start_url(&start);
        assert_eq!(boundary.as_str(), "https://site.test/docs/");
    }

    #[test]
    fn test_in_scope_sibling() {
        let link = normalize("https://site.test/docs/guide/config.html", &start_url()).unwrap();
        assert!(in_scope(&link, &boundary()));
    }

    #[test]
    fn test_out_of_scope_other_directory() {
        let link = normalize("https://site.test/other/x.html", &start_url()).unwrap();
        assert!(!in_scope(&link, &boundary()));
    }

    #[test]
    fn test_out_of_scope_sibling_prefix() {
        let link = normalize("https://site.test/docs/guide-old/x.html", &start_url()).unwrap();
        assert!(!in_scope(&link, &boundary()));
    }

    #[test]
    fn test_out_of_scope_other_host() {
        let link = normalize("https://elsewhere.test/docs/guide/x.html", &start_url()).unwrap();
        assert!(!in_scope(&link, &boundary()));
    }

    #[test]
    fn test_nested_link_with_fragment_in_scope() {
        let link = normalize("https://site.test/docs/guide/sub/x.html#frag", &start_url()).unwrap();
        assert_eq!(link.as_str(), "https://site.test/docs/guide/sub/x.html");
        assert!(in_scope(&link, &boundary()));
    }

    #[test]
    fn test_dedup_preserves_first_seen_order() {
        let links = vec![raw("a.html"), raw("b.html"), raw("a.html"), raw("c.html")];
        let work = build_work_list(&links, &start_url(), &boundary());

        let got: Vec<&str> = work.links().map(Link::as_str).collect();
        assert_eq!(
            got,
            vec![
                "https://site.test/docs/guide/a.html",
                "https://site.test/docs/guide/b.html",
                "https://site.test/docs/guide/c.html",
            ]
        );
    }

    #[test]
    fn test_dedup_ignores_fragments() {
        let links = vec![raw("a.html#one"), raw("a.html#two"), raw("a.html")];
        let work = build_work_list(&links, &start_url(), &boundary());
        assert_eq!(work.len(), 1);
    }

    #[test]
    fn test_relative_and_absolute_forms_dedup() {
        let links = vec![
            raw("config.html"),
            raw("https://SITE.test/docs/guide/config.html"),
            raw("./config.html#x"),
        ];
        let work = build_work_list(&links, &start_url(), &boundary());
        assert_eq!(work.len(), 1);
    }

    #[test]
    fn test_out_of_scope_filtered() {
        let links = vec![
            raw("config.html"),
            raw("/other/x.html"),
            raw("mailto:docs@site.test"),
            raw("sub/deep.html"),
        ];
        let work = build_work_list(&links, &start_url(), &boundary());
        let got: Vec<&str> = work.links().map(Link::as_str).collect();
        assert_eq!(
            got,
            vec![
                "https://site.test/docs/guide/config.html",
                "https://site.test/docs/guide/sub/deep.html",
            ]
        );
    }

    #[test]
    fn test_label_from_first_occurrence() {
        let links = vec![
            RawLink::new("a.html", "  Getting Started "),
            RawLink::new("a.html#more", "More"),
            RawLink::new("b.html", ""),
        ];
        let work = build_work_list(&links, &start_url(), &boundary());
        let items: Vec<&WorkItem> = work.iter().collect();
        assert_eq!(items[0].label.as_deref(), Some("Getting Started"));
        assert_eq!(items[1].label, None);
    }

    #[test]
    fn test_empty_input_gives_empty_work_list() {
        let work = build_work_list(&[], &start_url(), &boundary());
        assert!(work.is_empty());
    }
}
