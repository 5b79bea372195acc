//! HTTP presentation layer for the API starter
//!
//! Routes, the request pipeline (CORS, request ids, rate limiting, bearer
//! auth, validation) and the JSON response envelope.

pub mod envelope;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use envelope::{ApiFailure, ApiResponse, Envelope, ErrorBody, failure, success};
pub use error::{ApiError, ErrorCode};
pub use middleware::{
    BearerAuthLayer, CorsPolicy, RateLimiterConfig, RateLimiterLayer, RateLimiterState,
    ValidatedJson, ValidatedPath, ValidatedQuery,
};
pub use openapi::ApiDoc;
pub use routes::{create_app, create_router};
pub use state::AppState;
