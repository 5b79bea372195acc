//! Health check and welcome handlers

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::envelope::{ApiResponse, success};

/// Public API version
pub const API_VERSION: &str = "1.0.0";

/// Health check payload
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

/// Welcome payload
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WelcomeResponse {
    pub message: String,
    pub docs: String,
}

/// Health check
///
/// Reports liveness, the API version and the server clock.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is up", body = crate::openapi::HealthEnvelope)
    )
)]
pub async fn health_check() -> ApiResponse<HealthResponse> {
    success(HealthResponse {
        status: "ok".to_string(),
        version: API_VERSION.to_string(),
        timestamp: Utc::now().timestamp_millis(),
    })
}

/// Welcome message
///
/// Points at the API reference.
#[utoipa::path(
    get,
    path = "/api/v1/",
    tag = "health",
    responses(
        (status = 200, description = "Welcome message", body = crate::openapi::WelcomeEnvelope)
    )
)]
pub async fn welcome() -> ApiResponse<WelcomeResponse> {
    success(WelcomeResponse {
        message: "Welcome to the API".to_string(),
        docs: "/api/v1/redoc".to_string(),
    })
}
