//! Queryable documents built from HTML or JSON responses.
//!
//! JSON bodies are rewritten into equivalent markup so that the same CSS
//! selectors apply to both formats.

use scraper::html::Select;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::rules::ResponseKind;
use crate::types::SearchResult;

/// Tag used for items of a top-level JSON array.
const ARRAY_ITEM_TAG: &str = "item";

/// A parsed response body.
pub enum ParsedDocument {
    Html(Html),
    JsonAsDocument(Html),
}

impl ParsedDocument {
    /// Parse `body` according to the site's response format.
    pub fn parse(body: &str, kind: ResponseKind) -> SearchResult<Self> {
        match kind {
            ResponseKind::Html => Ok(Self::Html(Html::parse_document(body))),
            ResponseKind::Json => {
                let value: Value = serde_json::from_str(body)?;
                Ok(Self::JsonAsDocument(Html::parse_document(&json_to_markup(
                    &value,
                ))))
            }
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, Self::JsonAsDocument(_))
    }

    fn html(&self) -> &Html {
        match self {
            Self::Html(html) | Self::JsonAsDocument(html) => html,
        }
    }

    /// All elements matching `selector`, in document order.
    pub fn select<'a, 'b>(&'a self, selector: &'b Selector) -> Select<'a, 'b> {
        self.html().select(selector)
    }
}

/// Serialize a JSON value as markup.
///
/// Object keys become element tags, an array under a key repeats that key's
/// element once per item, and scalars become escaped text content.
pub fn json_to_markup(value: &Value) -> String {
    let mut out = String::new();
    match value {
        Value::Array(items) => {
            for item in items {
                write_element(&mut out, ARRAY_ITEM_TAG, item);
            }
        }
        _ => write_content(&mut out, value),
    }
    out
}

fn write_content(out: &mut String, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let tag = tag_name(key);
                match child {
                    Value::Array(items) => {
                        for item in items {
                            write_element(out, &tag, item);
                        }
                    }
                    _ => write_element(out, &tag, child),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                write_element(out, ARRAY_ITEM_TAG, item);
            }
        }
        Value::String(s) => out.push_str(&html_escape::encode_text(s)),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Null => {}
    }
}

fn write_element(out: &mut String, tag: &str, value: &Value) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    write_content(out, value);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Lower-case `key` and replace anything outside `[a-z0-9_-]`.
///
/// Names must start with a letter to parse as a tag.
fn tag_name(key: &str) -> String {
    let mut tag: String = key
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !tag.starts_with(|c: char| c.is_ascii_alphabetic()) {
        tag.insert(0, 'x');
    }
    tag
}
