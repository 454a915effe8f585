//! Single-site search: fetch, decode, parse, extract, filter.

use std::sync::Arc;
use std::time::Instant;

use scraper::Selector;
use tracing::{debug, info, warn};

use crate::document::ParsedDocument;
use crate::encoding::decode_body;
use crate::extract::extract;
use crate::fetch::HttpClient;
use crate::rules::{SiteRegistry, SiteRule};
use crate::types::{Book, SearchError, SearchResult, SiteResult};

/// Selectors of one rule, compiled for a single search.
struct CompiledRule {
    book_list: Selector,
    name: Option<Selector>,
    url: Option<Selector>,
    author: Option<Selector>,
    summary: Option<Selector>,
}

impl CompiledRule {
    fn compile(rule: &SiteRule) -> SearchResult<Self> {
        Ok(Self {
            book_list: compile(&rule.book_list_selector)?,
            name: compile_optional(Some(&rule.name_selector))?,
            url: compile_optional(Some(&rule.url_selector))?,
            author: compile_optional(rule.author_selector.as_deref())?,
            summary: compile_optional(rule.summary_selector.as_deref())?,
        })
    }
}

fn compile(css: &str) -> SearchResult<Selector> {
    Selector::parse(css.trim()).map_err(|e| SearchError::Selector(format!("{css}: {e:?}")))
}

fn compile_optional(css: Option<&str>) -> SearchResult<Option<Selector>> {
    match css.map(str::trim) {
        Some(css) if !css.is_empty() => compile(css).map(Some),
        _ => Ok(None),
    }
}

/// Parse a decoded body and return the books whose name contains `query`.
///
/// `query` must already be normalized (see [`crate::normalize_query`]).
pub fn extract_books(rule: &SiteRule, body: &str, query: &str) -> SearchResult<Vec<Book>> {
    let selectors = CompiledRule::compile(rule)?;
    let document = ParsedDocument::parse(body, rule.kind)?;
    let url_as_attribute = !document.is_json();

    let books = document
        .select(&selectors.book_list)
        .map(|node| Book {
            name: extract(node, selectors.name.as_ref(), false),
            url: rule.canonical_url(&extract(node, selectors.url.as_ref(), url_as_attribute)),
            author: extract(node, selectors.author.as_ref(), false),
            summary: extract(node, selectors.summary.as_ref(), false),
        })
        .filter(|book| !book.name.is_empty() && book.name.to_lowercase().contains(query))
        .collect();
    Ok(books)
}

/// Runs one query against one site rule.
#[derive(Clone)]
pub struct SiteSearcher {
    client: HttpClient,
    registry: Arc<SiteRegistry>,
}

impl SiteSearcher {
    pub fn new(client: HttpClient, registry: Arc<SiteRegistry>) -> Self {
        Self { client, registry }
    }

    /// A searcher over the compiled-in rule table.
    pub fn builtin(client: HttpClient) -> Self {
        Self::new(client, Arc::new(SiteRegistry::builtin().clone()))
    }

    pub fn registry(&self) -> &SiteRegistry {
        &self.registry
    }

    /// Search the site at `index`.
    ///
    /// Only an out-of-range index is an error; every per-site failure is
    /// reported inside the returned [`SiteResult`].
    pub async fn search(&self, query: &str, index: usize) -> SearchResult<SiteResult> {
        let rule = self
            .registry
            .get(index)
            .ok_or(SearchError::UnknownSite(index))?;
        Ok(self.search_rule(rule, query).await)
    }

    /// Search one rule. Never fails.
    pub async fn search_rule(&self, rule: &SiteRule, query: &str) -> SiteResult {
        let started = Instant::now();
        let mut result = SiteResult::new(rule.site.as_str());

        match self.fetch_books(rule, query).await {
            Ok(books) => {
                result.books = books;
                info!(
                    site = %rule.site,
                    books = result.books.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "site search finished"
                );
            }
            Err(e) => {
                warn!(site = %rule.site, error = %e, "site search failed");
                result.record_error(e);
            }
        }

        result.time = started.elapsed().as_millis() as u64;
        result
    }

    async fn fetch_books(&self, rule: &SiteRule, query: &str) -> SearchResult<Vec<Book>> {
        let url = rule.search_url_for(query);
        debug!(site = %rule.site, %url, "dispatching site search");
        let bytes = self.client.get_bytes(&url).await?;
        let body = decode_body(&bytes, rule.encoding);
        extract_books(rule, &body, query)
    }
}
