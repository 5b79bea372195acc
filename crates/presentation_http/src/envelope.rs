//! Response envelope
//!
//! Success: `{"ok": true, "data": ..., "meta"?: ...}`.
//! Failure: `{"ok": false, "error": {"code", "message", "details"?, "requestId"?}, "meta"?: ...}`.
//! `ok` is a type-level constant, so a success body can never carry an error
//! and the other way round.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::warn;
use utoipa::ToSchema;

use crate::{
    error::{ApiError, ErrorCode, finish_error_response},
    middleware::current_request_id,
};

/// Boolean that is fixed at compile time
#[derive(Debug, Clone, Copy, Default)]
pub struct Flag<const OK: bool>;

impl<const OK: bool> Serialize for Flag<OK> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(OK)
    }
}

/// Error object of a failure envelope
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Machine-readable code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Structured details (validation issues)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
    /// Request id of the failed request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Wire shape of every JSON body the API produces
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Envelope<T, M = Value> {
    Success {
        ok: Flag<true>,
        data: T,
        #[serde(skip_serializing_if = "Option::is_none")]
        meta: Option<M>,
    },
    Failure {
        ok: Flag<false>,
        error: ErrorBody,
        #[serde(skip_serializing_if = "Option::is_none")]
        meta: Option<M>,
    },
}

/// Successful response under construction
#[derive(Debug)]
pub struct ApiResponse<T, M = Value> {
    status: StatusCode,
    data: T,
    meta: Option<M>,
}

/// Wrap `data` in a 200 success envelope
pub fn success<T: Serialize>(data: T) -> ApiResponse<T> {
    ApiResponse {
        status: StatusCode::OK,
        data,
        meta: None,
    }
}

impl<T: Serialize, M: Serialize> ApiResponse<T, M> {
    /// Override the status code (must be 2xx)
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        debug_assert!(status.is_success());
        self.status = status;
        self
    }

    /// Attach a `meta` object
    pub fn with_meta<N: Serialize>(self, meta: N) -> ApiResponse<T, N> {
        ApiResponse {
            status: self.status,
            data: self.data,
            meta: Some(meta),
        }
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Envelope that will be serialized
    pub fn into_envelope(self) -> Envelope<T, M> {
        Envelope::Success {
            ok: Flag,
            data: self.data,
            meta: self.meta,
        }
    }
}

impl<T: Serialize, M: Serialize> IntoResponse for ApiResponse<T, M> {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self.into_envelope())).into_response()
    }
}

/// Failure response under construction
#[derive(Debug)]
pub struct ApiFailure {
    error: ApiError,
    meta: Option<Value>,
}

/// Wrap an error in a failure envelope
pub fn failure(error: ApiError) -> ApiFailure {
    ApiFailure { error, meta: None }
}

impl ApiFailure {
    /// Attach a `meta` object
    #[must_use]
    pub fn with_meta(mut self, meta: impl Serialize) -> Self {
        match serde_json::to_value(meta) {
            Ok(value) => self.meta = Some(value),
            Err(e) => warn!(error = %e, "Dropping unserializable error meta"),
        }
        self
    }

    /// Envelope that will be serialized
    pub fn into_envelope(self) -> Envelope<(), Value> {
        let Self { error, meta } = self;
        failure_envelope(&error, meta)
    }
}

/// Rate limit rejections report the wait in `meta` when no meta was given
fn failure_envelope(error: &ApiError, meta: Option<Value>) -> Envelope<(), Value> {
    let meta = meta.or_else(|| match error {
        ApiError::RateLimited { retry_after_secs } => {
            Some(serde_json::json!({ "retryAfter": retry_after_secs }))
        },
        _ => None,
    });

    Envelope::Failure {
        ok: Flag,
        error: error.to_body(current_request_id()),
        meta,
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let Self { error, meta } = self;
        let mut response = (error.status(), Json(failure_envelope(&error, meta))).into_response();
        finish_error_response(&error, &mut response);
        response
    }
}
