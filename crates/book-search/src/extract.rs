//! Field extraction from matched book nodes.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

/// Attribute read when a URL field comes from markup.
const LINK_ATTR: &str = "href";

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"</?.*?>").expect("tag pattern is valid"))
}

/// Remove every whitespace character, then every `<...>` tag-like substring.
pub fn strip_blank(text: &str) -> String {
    let compact: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{FEFF}')
        .collect();
    tag_pattern().replace_all(&compact, "").into_owned()
}

/// Normalize a raw user query: strip blanks and tags, then lower-case.
pub fn normalize_query(raw: &str) -> String {
    strip_blank(raw).to_lowercase()
}

/// Read one field below `node`.
///
/// Returns the first matching descendant's `href` (when `as_attribute`) or
/// text content, passed through [`strip_blank`]. A missing selector, no match,
/// or a missing attribute all yield `""`.
pub fn extract(node: ElementRef<'_>, selector: Option<&Selector>, as_attribute: bool) -> String {
    let Some(selector) = selector else {
        return String::new();
    };
    let Some(found) = node.select(selector).next() else {
        return String::new();
    };
    if as_attribute {
        found
            .value()
            .attr(LINK_ATTR)
            .map(strip_blank)
            .unwrap_or_default()
    } else {
        strip_blank(&found.text().collect::<String>())
    }
}
