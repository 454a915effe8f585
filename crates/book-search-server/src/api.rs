//! HTTP API for book search.
//!
//! One search per request: `GET /api/search?name=<query>&src=<index>` runs
//! a single site. Fanning a query out across sites is the caller's job.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use book_search::{normalize_query, HttpClient, SiteSearcher};
use serde::Deserialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ServerConfig;
use crate::error::ApiError;

/// Shared state passed to all handlers.
pub struct AppState {
    pub searcher: SiteSearcher,
    pub config: ServerConfig,
}

impl AppState {
    /// State over the built-in rule table, with a client built from `config`.
    pub fn new(config: ServerConfig) -> Self {
        let client = HttpClient::new(&config.user_agent, config.upstream_timeout_ms);
        Self {
            searcher: SiteSearcher::builtin(client),
            config,
        }
    }

    pub fn with_searcher(searcher: SiteSearcher, config: ServerConfig) -> Self {
        Self { searcher, config }
    }
}

/// Build the axum Router with all endpoints.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/sites", get(handle_sites))
        .route("/api/search", get(handle_search))
        .layer(cors)
        .with_state(state)
}

/// Serve the API on `config.addr` until the process exits.
pub async fn start(config: ServerConfig) -> anyhow::Result<()> {
    let addr = config.addr.clone();
    let state = Arc::new(AppState::new(config));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("book search API listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

// ── Validation ──────────────────────────────────────────────────

/// Raw `/api/search` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub name: Option<String>,
    pub src: Option<String>,
}

/// Normalize the query and parse the site index.
///
/// The query must be non-empty after normalization and `src` must be an
/// integer in `[0, site_count)`.
pub fn validate_params(
    params: &SearchParams,
    site_count: usize,
) -> Result<(String, usize), ApiError> {
    let query = params
        .name
        .as_deref()
        .map(normalize_query)
        .filter(|q| !q.is_empty())
        .ok_or(ApiError::InvalidParams)?;

    let index = params
        .src
        .as_deref()
        .and_then(|src| src.trim().parse::<i64>().ok())
        .filter(|i| *i >= 0)
        .and_then(|i| usize::try_from(i).ok())
        .filter(|i| *i < site_count)
        .ok_or(ApiError::InvalidParams)?;

    Ok((query, index))
}

// ── Handlers ────────────────────────────────────────────────────

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "sites": state.searcher.registry().len(),
    }))
}

async fn handle_sites(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(serde_json::json!({ "sites": state.searcher.registry().summaries() }))
}

async fn handle_search(
    State(state): State<Arc<AppState>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params.map_err(|e| {
        tracing::debug!("rejected search query: {e}");
        ApiError::InvalidParams
    })?;
    let (query, index) = validate_params(&params, state.searcher.registry().len())?;

    let searcher = state.searcher.clone();
    let result = tokio::spawn(async move { searcher.search(&query, index).await })
        .await
        .map_err(|e| ApiError::Internal(format!("search task panicked: {e}")))?
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        [(header::CACHE_CONTROL, state.config.cache_control())],
        Json(result),
    )
        .into_response())
}
