//! Configuration loading and resolution.
//!
//! Every setting resolves as: explicit flag, then environment variable,
//! then the built-in default.

use book_search::DESKTOP_USER_AGENT;

pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";

/// Shared edge-cache lifetime for search responses (two days).
pub const DEFAULT_CACHE_MAX_AGE: u64 = 172_800;

pub const ENV_ADDR: &str = "BOOK_SEARCH_ADDR";
pub const ENV_CACHE_MAX_AGE: &str = "BOOK_SEARCH_CACHE_MAX_AGE";
pub const ENV_TIMEOUT_MS: &str = "BOOK_SEARCH_TIMEOUT_MS";
pub const ENV_USER_AGENT: &str = "BOOK_SEARCH_USER_AGENT";
pub const ENV_SERVER: &str = "BOOK_SEARCH_SERVER";

/// Resolved settings for the HTTP API.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
    /// `s-maxage` advertised on search responses; `0` disables caching.
    pub cache_max_age: u64,
    /// Upstream request timeout. `None` leaves the transport default.
    pub upstream_timeout_ms: Option<u64>,
    pub user_agent: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            upstream_timeout_ms: None,
            user_agent: DESKTOP_USER_AGENT.to_string(),
        }
    }
}

impl ServerConfig {
    /// Resolve every field from explicit values and the environment.
    pub fn resolve(
        addr: Option<&str>,
        cache_max_age: Option<u64>,
        upstream_timeout_ms: Option<u64>,
        user_agent: Option<&str>,
    ) -> Self {
        Self {
            addr: resolve_addr(addr),
            cache_max_age: resolve_cache_max_age(cache_max_age),
            upstream_timeout_ms: resolve_timeout_ms(upstream_timeout_ms),
            user_agent: resolve_user_agent(user_agent),
        }
    }

    /// `Cache-Control` value for successful search responses.
    pub fn cache_control(&self) -> String {
        if self.cache_max_age == 0 {
            "no-store".to_string()
        } else {
            format!("max-age=0, s-maxage={}", self.cache_max_age)
        }
    }
}

pub fn resolve_addr(explicit: Option<&str>) -> String {
    if let Some(addr) = explicit {
        return addr.to_string();
    }
    std::env::var(ENV_ADDR).unwrap_or_else(|_| DEFAULT_ADDR.to_string())
}

pub fn resolve_cache_max_age(explicit: Option<u64>) -> u64 {
    explicit
        .or_else(|| env_number(ENV_CACHE_MAX_AGE))
        .unwrap_or(DEFAULT_CACHE_MAX_AGE)
}

pub fn resolve_timeout_ms(explicit: Option<u64>) -> Option<u64> {
    explicit.or_else(|| env_number(ENV_TIMEOUT_MS))
}

pub fn resolve_user_agent(explicit: Option<&str>) -> String {
    if let Some(ua) = explicit {
        return ua.to_string();
    }
    std::env::var(ENV_USER_AGENT).unwrap_or_else(|_| DESKTOP_USER_AGENT.to_string())
}

/// Base URL of a remote API for fan-out, if one is configured.
pub fn resolve_server(explicit: Option<&str>) -> Option<String> {
    explicit
        .map(str::to_string)
        .or_else(|| std::env::var(ENV_SERVER).ok())
        .map(|url| url.trim_end_matches('/').to_string())
}

fn env_number(key: &str) -> Option<u64> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!("ignoring {key}={raw:?}: not a number");
            None
        }
    }
}
