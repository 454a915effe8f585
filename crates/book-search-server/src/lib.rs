// Copyright 2026 Book Search Contributors
// SPDX-License-Identifier: MIT

//! book-search server — HTTP API, fan-out client, and terminal rendering.

pub mod api;
pub mod config;
pub mod error;
pub mod fanout;
pub mod render;

pub use api::{router, AppState};
pub use config::ServerConfig;
pub use error::{ApiError, ClientError};
pub use fanout::{fan_out, search_local, FanOutClient, FanOutState};
