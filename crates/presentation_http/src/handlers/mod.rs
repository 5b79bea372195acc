//! HTTP request handlers

pub mod auth;
pub mod health;
pub mod users;

use crate::error::ApiError;

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not Found".to_string())
}
