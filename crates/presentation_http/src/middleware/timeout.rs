//! Request-wide timeout
//!
//! Requests that take longer than the configured limit are dropped and
//! answered with a 408 envelope.

use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::error::ApiError;

/// `from_fn_with_state` middleware enforcing `limit`
pub async fn enforce_timeout(State(limit): State<Duration>, req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    match tokio::time::timeout(limit, next.run(req)).await {
        Ok(response) => response,
        Err(_) => {
            warn!(path = %path, limit_secs = limit.as_secs(), "Request timed out");
            ApiError::RequestTimeout.into_response()
        },
    }
}
