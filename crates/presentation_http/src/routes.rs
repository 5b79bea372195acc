//! Route definitions and the middleware stack

use std::{any::Any, sync::Arc};

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::{
    error::ApiError,
    handlers,
    middleware::{
        BearerAuthLayer, CorsPolicy, RateLimiterConfig, RateLimiterLayer, RateLimiterState,
        RequestIdLayer, SecurityHeadersLayer, enforce_timeout, parse_origins, pretty_json,
    },
    openapi,
    state::AppState,
};

/// Create the router with all routes, without the middleware stack
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/", get(handlers::health::welcome))
        .route("/api/v1/health", get(handlers::health::health_check))
        .route(
            "/api/v1/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route("/api/v1/users/{id}", get(handlers::users::get_user))
        .route("/api/v1/auth/verify", get(handlers::auth::verify))
        .merge(openapi::create_openapi_routes())
        .fallback(handlers::not_found)
        .with_state(state)
}

/// Rate limiter settings taken from the application configuration
pub fn rate_limiter_config(state: &AppState) -> RateLimiterConfig {
    RateLimiterConfig {
        enabled: state.config.rate_limit_enabled,
        points: state.config.rate_limit_points,
        window: state.config.rate_limit_window(),
    }
}

/// Create the full application: routes wrapped in the request pipeline
///
/// Outermost first: request id, CORS, trace, security headers, pretty JSON
/// (development), timeout (when configured), rate limiter, bearer gate,
/// panic catcher, router.
pub fn create_app(state: AppState, rate_limiter: Arc<RateLimiterState>) -> Router {
    let config = Arc::clone(&state.config);
    let cors = CorsPolicy::from_origins(parse_origins(config.cors_origins.as_ref()));
    let limiter = RateLimiterLayer::with_state(&rate_limiter_config(&state), rate_limiter);

    let mut app = create_router(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(BearerAuthLayer::new(
            config.auth_token().cloned(),
            config.auth_path_prefix.clone(),
        ))
        .layer(limiter);

    if let Some(limit) = config.request_timeout() {
        app = app.layer(from_fn_with_state(limit, enforce_timeout));
    }

    if !config.app_env.is_production() {
        app = app.layer(from_fn(pretty_json));
    }

    app.layer(SecurityHeadersLayer::new(&config.server_name))
        .layer(TraceLayer::new_for_http())
        .layer(cors.layer())
        .layer(RequestIdLayer::new())
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");

    ApiError::Internal(format!("handler panicked: {detail}")).into_response()
}
