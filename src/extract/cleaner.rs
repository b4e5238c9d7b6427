//! Boilerplate removal
//!
//! Strips page chrome from a parsed document before the main content is
//! located, so that navigation menus and footers never take part in scoring.

use ego_tree::NodeId;
use scraper::{ElementRef, Html};

/// Elements removed by tag name
pub const DENYLISTED_TAGS: &[&str] = &[
    "nav", "header", "footer", "script", "style", "noscript", "iframe", "template", "form",
];

/// Elements removed when they carry one of these classes
pub const DENYLISTED_CLASSES: &[&str] = &[
    "header",
    "footer",
    "navigation",
    "sidebar",
    "menu",
    "comments",
];

/// Never removed, whatever their classes say
const PROTECTED_TAGS: &[&str] = &["html", "head", "body"];

/// Removes every denylisted element from the document, in place
///
/// Returns the number of elements detached. Running it again on a cleaned
/// document finds nothing and returns 0.
pub fn clean(document: &mut Html) -> usize {
    let doomed: Vec<NodeId> = document
        .tree
        .root()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| is_denylisted(*element))
        .map(|element| element.id())
        .collect();

    let mut removed = 0;
    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
            removed += 1;
        }
    }

    if removed > 0 {
        tracing::debug!("Removed {} boilerplate elements", removed);
    }

    removed
}

/// Returns true if the element is page chrome
pub fn is_denylisted(element: ElementRef<'_>) -> bool {
    let value = element.value();
    let name = value.name();

    if DENYLISTED_TAGS.contains(&name) {
        return true;
    }

    !PROTECTED_TAGS.contains(&name)
        && value
            .classes()
            .any(|class| DENYLISTED_CLASSES.contains(&class))
}
