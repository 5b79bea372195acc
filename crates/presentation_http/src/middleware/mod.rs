//! HTTP middleware components
//!
//! Admission gates (CORS, rate limiting, bearer auth), request correlation,
//! input validation and response shaping.

pub mod auth;
pub mod cors;
pub mod pretty_json;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod timeout;
pub mod validation;

pub use auth::{Authorization, BearerAuth, BearerAuthLayer, BearerGate};
pub use cors::{CorsDecision, CorsPolicy, OriginSet, parse_origins};
pub use pretty_json::pretty_json;
pub use rate_limit::{
    Admission, RateLimiter, RateLimiterConfig, RateLimiterLayer, RateLimiterState, client_identity,
    spawn_sweep_task,
};
pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdLayer, current_request_id};
pub use security_headers::SecurityHeadersLayer;
pub use timeout::enforce_timeout;
pub use validation::{FieldError, ValidatedJson, ValidatedPath, ValidatedQuery, ValidationTarget};
