//! Bearer-protected routes
//!
//! Everything here sits under the protected prefix, so a handler only runs
//! once the bearer gate has admitted the request.

use serde::Serialize;
use utoipa::ToSchema;

use crate::envelope::{ApiResponse, success};

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct VerifyResponse {
    pub authorized: bool,
}

/// Verify a bearer token
///
/// Succeeds only when the `Authorization` header carries the configured
/// secret.
#[utoipa::path(
    get,
    path = "/api/v1/auth/verify",
    tag = "auth",
    responses(
        (status = 200, description = "Token accepted", body = crate::openapi::VerifyEnvelope),
        (status = 401, description = "Missing or wrong token", body = crate::openapi::ErrorEnvelope)
    ),
    security(("bearer" = []))
)]
pub async fn verify() -> ApiResponse<VerifyResponse> {
    success(VerifyResponse { authorized: true })
}
