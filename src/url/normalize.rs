use crate::url::Link;
use url::Url;

/// Href prefixes that never point at a fetchable page
const SKIPPED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Normalizes a possibly-relative href into a [`Link`]
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace; skip empty hrefs
/// 2. Skip `javascript:`, `mailto:`, `tel:` and `data:` hrefs
/// 3. Resolve against `base` (the page's final URL)
/// 4. Reject anything that is not HTTP or HTTPS after resolution
/// 5. Remove the fragment (everything after `#`)
///
/// Resolution lowercases scheme and host, drops default ports and removes
/// dot segments. Path and trailing slash are kept as written, so the result
/// is stable: normalizing a normalized link returns it unchanged.
///
/// # Arguments
///
/// * `href` - The raw href attribute value
/// * `base` - The base URL of the page the href was found on
///
/// # Returns
///
/// * `Some(Link)` - The canonical absolute link
/// * `None` - The href does not resolve to an HTTP(S) page
///
/// # Examples
///
/// ```
/// use doc_scribe::url::normalize;
/// use url::Url;
///
/// let base = Url::parse("https://Docs.Example.com/guide/install.html").unwrap();
/// let link = normalize("config.html#options", &base).unwrap();
/// assert_eq!(link.as_str(), "https://docs.example.com/guide/config.html");
/// ```
pub fn normalize(href: &str, base: &Url) -> Option<Link> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if SKIPPED_SCHEMES
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let mut url = base.join(href).ok()?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    url.set_fragment(None);

    Some(Link(url.to_string()))
}
