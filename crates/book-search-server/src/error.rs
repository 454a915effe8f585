//! Error types for the HTTP API and the fan-out client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Message returned for any malformed `/api/search` request.
pub const INVALID_PARAMS_MESSAGE: &str = "param 'name' and 'src' should be string and not empty";

/// Errors surfaced by API handlers.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("param 'name' and 'src' should be string and not empty")]
    InvalidParams,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidParams => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {self}");
        }
        (status, Json(serde_json::json!({ "message": self.to_string() }))).into_response()
    }
}

/// Errors raised by [`crate::fanout::FanOutClient`].
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx API status; displays the response body.
    #[error("{body}")]
    Status { status: u16, body: String },
}

pub type ClientResult<T> = Result<T, ClientError>;
