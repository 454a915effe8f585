// Copyright 2026 Book Search Contributors
// SPDX-License-Identifier: MIT

//! book-search — per-site scraping rules, field extraction, and single-site search.

pub mod document;
pub mod encoding;
pub mod extract;
pub mod fetch;
pub mod rules;
pub mod search;
pub mod types;

pub use document::{json_to_markup, ParsedDocument};
pub use encoding::{decode_body, encode_query, encode_uri_component, encode_uri_gbk};
pub use extract::{extract, normalize_query, strip_blank};
pub use fetch::{HttpClient, DESKTOP_USER_AGENT};
pub use rules::{ResponseKind, SiteRegistry, SiteRule, SiteSummary, TextEncoding};
pub use search::{extract_books, SiteSearcher};
pub use types::*;
