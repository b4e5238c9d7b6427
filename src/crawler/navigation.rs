//! Navigation container lookup and link extraction
//!
//! The navigation element is named by a single identifier that is tried as
//! an element id first and as a class name second. Lookups are an ordered
//! list of strategies; the first one that finds an element wins.

use crate::url::RawLink;
use crate::ScribeError;
use scraper::{ElementRef, Html, Selector};
use std::fmt;

/// How the navigation container was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Id,
    Class,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id => f.write_str("ID"),
            Self::Class => f.write_str("Class"),
        }
    }
}

/// A lookup strategy: returns the first element matching `name`, if any
pub type LookupFn = for<'a> fn(&'a Html, &str) -> Option<ElementRef<'a>>;

/// Strategies in the order they are attempted
pub const LOOKUP_ORDER: &[(LookupKind, LookupFn)] = &[
    (LookupKind::Id, find_by_id),
    (LookupKind::Class, find_by_class),
];

/// The located navigation element
#[derive(Debug, Clone, Copy)]
pub struct NavigationContainer<'a> {
    pub element: ElementRef<'a>,
    pub matched_by: LookupKind,
}

/// Finds the navigation container by id, then by class
///
/// # Arguments
///
/// * `document` - The parsed start page
/// * `id_or_class` - The identifier to look for
/// * `page_url` - The page's URL, for error reporting
///
/// # Returns
///
/// * `Ok(NavigationContainer)` - The first element found
/// * `Err(ScribeError::NavigationNotFound)` - No strategy matched
pub fn find_container<'a>(
    document: &'a Html,
    id_or_class: &str,
    page_url: &str,
) -> Result<NavigationContainer<'a>, ScribeError> {
    let name = id_or_class.trim();

    for (kind, lookup) in LOOKUP_ORDER {
        if let Some(element) = lookup(document, name) {
            return Ok(NavigationContainer {
                element,
                matched_by: *kind,
            });
        }
    }

    Err(ScribeError::NavigationNotFound {
        selector: name.to_string(),
        url: page_url.to_string(),
    })
}

/// Finds the first element whose `id` attribute equals `name`
pub fn find_by_id<'a>(document: &'a Html, name: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse("[id]").ok()?;
    document
        .select(&selector)
        .find(|element| element.value().id() == Some(name))
}

/// Finds the first element carrying `name` among its classes
pub fn find_by_class<'a>(document: &'a Html, name: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse("[class]").ok()?;
    document
        .select(&selector)
        .find(|element| element.value().classes().any(|class| class == name))
}

/// Collects every hyperlink inside the container, in document order
///
/// Duplicates are kept; de-duplication is the work list's job.
pub fn extract_links(container: &NavigationContainer<'_>) -> Vec<RawLink> {
    let Ok(selector) = Selector::parse("a[href], area[href]") else {
        return Vec::new();
    };

    container
        .element
        .select(&selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            let text = element.text().collect::<Vec<_>>().join(" ");
            Some(RawLink::new(href, collapse_whitespace(&text)))
        })
        .collect()
}

/// Returns the document's `<base href>` value, if present
pub fn base_href(document: &Html) -> Option<String> {
    let selector = Selector::parse("base[href]").ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
