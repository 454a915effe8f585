//! Result types shared by the search pipeline and the HTTP layer.

use serde::{Deserialize, Serialize};

/// A normalized book entry extracted from one site's result page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub name: String,
    pub url: String,
    pub author: String,
    /// Empty when the site has no summary selector or the field matched nothing.
    #[serde(default)]
    pub summary: String,
}

/// Outcome of searching one site for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteResult {
    pub site: String,
    pub success: bool,
    pub message: String,
    pub books: Vec<Book>,
    /// Wall-clock milliseconds from dispatch to completion or failure.
    pub time: u64,
}

impl SiteResult {
    /// An empty, successful result for `site`.
    pub fn new(site: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            success: true,
            message: String::new(),
            books: Vec::new(),
            time: 0,
        }
    }

    /// A failed result carrying `message` verbatim.
    pub fn failed(site: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            success: false,
            message: message.into(),
            books: Vec::new(),
            time: 0,
        }
    }

    /// Mark the result failed and append `error` on a new line.
    pub fn record_error(&mut self, error: impl std::fmt::Display) {
        self.success = false;
        self.message.push('\n');
        self.message.push_str(&error.to_string());
    }
}

/// Errors raised while searching a single site.
///
/// All of these are contained by [`crate::SiteSearcher::search_rule`] and
/// turned into a failed [`SiteResult`]; only `UnknownSite` escapes.
#[derive(thiserror::Error, Debug)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx upstream status; the display form is the response body.
    #[error("{body}")]
    Status { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("Unknown site index: {0}")]
    UnknownSite(usize),
}

/// Convenience result type.
pub type SearchResult<T> = Result<T, SearchError>;
