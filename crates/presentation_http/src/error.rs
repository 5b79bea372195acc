//! API error handling
//!
//! Every failure leaves the server as the same JSON envelope
//! (`{"ok": false, "error": {...}}`). Internal errors are logged with their
//! detail and the request id, but the client only ever sees a generic message.

use std::time::Duration;

use application::ApplicationError;
use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use domain::DomainError;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

use crate::{
    envelope::{self, ErrorBody},
    middleware::{current_request_id, validation::FieldError},
};

/// Message returned for every internal error
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Machine-readable error code carried in `error.code`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    RequestTimeout,
    Conflict,
    UnprocessableEntity,
    RateLimited,
    Internal,
}

impl ErrorCode {
    /// HTTP status paired with this code
    pub const fn status(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            Self::Conflict => StatusCode::CONFLICT,
            Self::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request timed out")]
    RequestTimeout,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed ({} issue(s))", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Error code for this variant
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::BadRequest(_) => ErrorCode::BadRequest,
            Self::Unauthorized(_) => ErrorCode::Unauthorized,
            Self::Forbidden(_) => ErrorCode::Forbidden,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::RequestTimeout => ErrorCode::RequestTimeout,
            Self::Conflict(_) => ErrorCode::Conflict,
            Self::Validation(_) => ErrorCode::UnprocessableEntity,
            Self::RateLimited { .. } => ErrorCode::RateLimited,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// HTTP status for this error
    pub const fn status(&self) -> StatusCode {
        self.code().status()
    }

    /// Rate limit rejection for a remaining window
    pub fn rate_limited(retry_after: Duration) -> Self {
        let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
        Self::RateLimited {
            retry_after_secs: secs.max(1),
        }
    }

    /// Build the public error body, without any internal detail
    pub fn to_body(&self, request_id: Option<String>) -> ErrorBody {
        let (message, details) = match self {
            Self::BadRequest(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg) => (msg.clone(), None),
            Self::RequestTimeout => ("Request Timeout".to_string(), None),
            Self::Validation(errors) => (
                "Validation failed".to_string(),
                Some(json!({ "errors": errors })),
            ),
            Self::RateLimited { .. } => ("Too Many Requests".to_string(), None),
            Self::Internal(_) => (INTERNAL_ERROR_MESSAGE.to_string(), None),
        };

        ErrorBody {
            code: self.code(),
            message,
            details,
            request_id,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        envelope::failure(self).into_response()
    }
}

/// Attach per-variant headers and log what must not reach the client
pub(crate) fn finish_error_response(error: &ApiError, response: &mut Response) {
    match error {
        ApiError::Unauthorized(_) => {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer"),
            );
        },
        ApiError::RateLimited { retry_after_secs } => {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(*retry_after_secs));
        },
        ApiError::Internal(detail) => {
            error!(
                request_id = current_request_id().as_deref().unwrap_or("-"),
                error = %detail,
                "Unhandled internal error"
            );
        },
        _ => {},
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { .. } => Self::NotFound(err.to_string()),
            DomainError::InvalidEmailAddress(_) | DomainError::ValidationError(_) => {
                Self::BadRequest(err.to_string())
            },
        }
    }
}

impl From<ApplicationError> for ApiError {
    fn from(err: ApplicationError) -> Self {
        match err {
            ApplicationError::Domain(e) => e.into(),
            ApplicationError::Internal(msg) => Self::Internal(msg),
        }
    }
}
