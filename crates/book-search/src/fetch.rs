//! Async HTTP client wrapping reqwest.
//!
//! One GET per call: no retries and no timeout unless one is configured.

use std::time::Duration;

use crate::types::{SearchError, SearchResult};

/// Desktop Edge user agent sent to every site.
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/84.0.4147.89 Safari/537.36 Edg/84.0.522.44";

/// Some sites only answer search requests that look like XHR.
const REQUESTED_WITH: (&str, &str) = ("X-Requested-With", "XMLHttpRequest");

/// HTTP client for upstream book sites.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Create a client with the given user agent and optional timeout.
    pub fn new(user_agent: &str, timeout_ms: Option<u64>) -> Self {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(user_agent);
        if let Some(ms) = timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let client = builder.build().unwrap_or_default();
        Self { client }
    }

    /// GET `url` and return the raw body bytes.
    ///
    /// A non-2xx status is an error whose message is the response body.
    pub async fn get_bytes(&self, url: &str) -> SearchResult<Vec<u8>> {
        let resp = self
            .client
            .get(url)
            .header(REQUESTED_WITH.0, REQUESTED_WITH.1)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp.bytes().await?.to_vec())
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(DESKTOP_USER_AGENT, None)
    }
}
