//! Fan-out: one search per site, aggregated as each settles.
//!
//! All per-site futures are polled from a single aggregating task, so the
//! accumulated [`FanOutState`] needs no locking. A site whose request fails
//! at the transport level gets a synthesized failed [`SiteResult`]; it never
//! aborts the rest of the batch.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;

use book_search::{
    encode_uri_component, normalize_query, SiteRegistry, SiteResult, SiteSearcher, SiteSummary,
};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Aggregate view of an in-flight or finished fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanOutState {
    /// True from dispatch until every site has settled.
    pub searching: bool,
    pub results: BTreeMap<usize, SiteResult>,
}

impl FanOutState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn result(&self, index: usize) -> Option<&SiteResult> {
        self.results.get(&index)
    }

    pub fn is_settled(&self, site_count: usize) -> bool {
        self.results.len() == site_count
    }
}

/// Dispatch one request per site and merge outcomes as they arrive.
///
/// `sites` holds display names in index order; they label synthesized
/// failures. `on_update` runs once at dispatch, after every merge, and once
/// more when the batch has settled.
pub async fn fan_out<F, Fut, E>(
    sites: &[String],
    mut dispatch: F,
    mut on_update: impl FnMut(&FanOutState),
) -> FanOutState
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<SiteResult, E>>,
    E: Display,
{
    let mut state = FanOutState {
        searching: true,
        results: BTreeMap::new(),
    };
    on_update(&state);

    let mut pending: FuturesUnordered<_> = (0..sites.len())
        .map(|index| {
            let fut = dispatch(index);
            async move { (index, fut.await) }
        })
        .collect();

    while let Some((index, outcome)) = pending.next().await {
        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                let site = sites[index].as_str();
                tracing::warn!(site, error = %e, "site request failed");
                SiteResult::failed(site, e.to_string())
            }
        };
        state.results.insert(index, result);
        on_update(&state);
    }

    state.searching = false;
    on_update(&state);
    state
}

/// Fan out directly over a [`SiteSearcher`], without an HTTP hop.
pub async fn search_local(
    searcher: &SiteSearcher,
    raw_query: &str,
    on_update: impl FnMut(&FanOutState),
) -> FanOutState {
    let query = normalize_query(raw_query);
    let names = searcher.registry().names();
    let q = query.as_str();
    fan_out(&names, move |index| searcher.search(q, index), on_update).await
}

/// Client for a remote book search API.
#[derive(Clone)]
pub struct FanOutClient {
    http: reqwest::Client,
    base_url: String,
}

impl FanOutClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The remote site table.
    pub async fn sites(&self) -> ClientResult<Vec<SiteSummary>> {
        #[derive(Deserialize)]
        struct SitesBody {
            sites: Vec<SiteSummary>,
        }

        let resp = self
            .http
            .get(format!("{}/api/sites", self.base_url))
            .send()
            .await?;
        let body: SitesBody = check(resp).await?.json().await?;
        Ok(body.sites)
    }

    /// Search one site by index.
    pub async fn search_site(&self, query: &str, index: usize) -> ClientResult<SiteResult> {
        let url = format!(
            "{}/api/search?src={index}&name={}",
            self.base_url,
            encode_uri_component(query)
        );
        let resp = self.http.get(url).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    /// Site display names in index order.
    ///
    /// Asks the API for its table and falls back to the compiled-in rules
    /// when the API cannot be reached.
    pub async fn site_names(&self) -> Vec<String> {
        match self.sites().await {
            Ok(sites) => sites.into_iter().map(|s| s.site).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "site table unavailable, using built-in rules");
                SiteRegistry::builtin().names()
            }
        }
    }

    /// Search every site in `sites` concurrently.
    ///
    /// Request failures become failed per-site results; the batch always
    /// settles with one entry per site.
    pub async fn search_all(
        &self,
        sites: &[String],
        query: &str,
        on_update: impl FnMut(&FanOutState),
    ) -> FanOutState {
        fan_out(sites, move |index| self.search_site(query, index), on_update).await
    }
}

async fn check(resp: reqwest::Response) -> ClientResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}
