//! OpenAPI documentation module
//!
//! The OpenAPI document is derived from the handler annotations. Two
//! read-only views are served next to it: a ReDoc page and `llms.txt`, a
//! plain-text endpoint summary for language models.

// Allow clippy warnings from macro-generated code in utoipa derive
#![allow(clippy::needless_for_each)]

use std::fmt::Write as _;

use axum::{Json, Router, response::Html, routing::get};
use serde_json::Value;
use utoipa::{OpenApi, ToSchema};
use utoipa_redoc::{Redoc, Servable as RedocServable};

use crate::{
    envelope::ErrorBody,
    error::ErrorCode,
    handlers::{
        self,
        auth::VerifyResponse,
        health::{HealthResponse, WelcomeResponse},
        users::{PageMeta, UserResponse},
    },
    middleware::validation::{FieldError, ValidationTarget},
    state::AppState,
};

pub const OPENAPI_PATH: &str = "/api/v1/openapi.json";
pub const REDOC_PATH: &str = "/api/v1/redoc";
pub const LLMS_TXT_PATH: &str = "/api/v1/llms.txt";

/// OpenAPI documentation for the API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "API Starter",
        version = "1.0.0",
        description = "Starter HTTP API with validation, CORS, rate limiting, bearer auth and a uniform JSON envelope",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    tags(
        (name = "health", description = "Liveness and welcome endpoints"),
        (name = "users", description = "Demo user resource (in-memory)"),
        (name = "auth", description = "Bearer-protected endpoints")
    ),
    paths(
        handlers::health::welcome,
        handlers::health::health_check,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::create_user,
        handlers::auth::verify,
    ),
    components(
        schemas(
            HealthResponse,
            WelcomeResponse,
            UserResponse,
            PageMeta,
            VerifyResponse,
            handlers::users::CreateUserRequest,
            ErrorBody,
            ErrorCode,
            FieldError,
            ValidationTarget,
            HealthEnvelope,
            WelcomeEnvelope,
            UserEnvelope,
            UserListEnvelope,
            VerifyEnvelope,
            ErrorEnvelope,
        )
    ),
    modifiers(&SecurityAddon)
)]
#[derive(Debug)]
pub struct ApiDoc;

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

// Envelope shapes as concrete schemas, one per payload.

#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct HealthEnvelope {
    #[schema(example = true)]
    ok: bool,
    data: HealthResponse,
}

#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct WelcomeEnvelope {
    #[schema(example = true)]
    ok: bool,
    data: WelcomeResponse,
}

#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UserEnvelope {
    #[schema(example = true)]
    ok: bool,
    data: UserResponse,
}

#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UserListEnvelope {
    #[schema(example = true)]
    ok: bool,
    data: Vec<UserResponse>,
    meta: PageMeta,
}

#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct VerifyEnvelope {
    #[schema(example = true)]
    ok: bool,
    data: VerifyResponse,
}

#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct ErrorEnvelope {
    #[schema(example = false)]
    ok: bool,
    error: ErrorBody,
    #[schema(value_type = Option<Object>)]
    meta: Option<Value>,
}

const METHODS: [&str; 5] = ["get", "post", "put", "patch", "delete"];

fn non_empty(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

/// Render the plain-text endpoint summary served as `llms.txt`
pub fn render_llms_txt(doc: &utoipa::openapi::OpenApi) -> String {
    let json = serde_json::to_value(doc).unwrap_or(Value::Null);

    let mut out = String::new();
    let _ = writeln!(out, "# {}", doc.info.title);
    if let Some(description) = doc.info.description.as_deref() {
        let _ = writeln!(out, "\n> {description}");
    }
    let _ = writeln!(out, "\nVersion: {}", doc.info.version);
    let _ = writeln!(out, "OpenAPI document: {OPENAPI_PATH}");
    let _ = writeln!(
        out,
        "Responses are JSON envelopes: {{\"ok\": true, \"data\": ...}} or \
         {{\"ok\": false, \"error\": {{\"code\", \"message\"}}}}."
    );
    let _ = writeln!(out, "\n## Endpoints\n");

    if let Some(paths) = json.get("paths").and_then(Value::as_object) {
        for (path, item) in paths {
            for method in METHODS {
                let Some(operation) = item.get(method) else {
                    continue;
                };
                let _ = write!(out, "- {} {path}", method.to_uppercase());
                if let Some(summary) = operation.get("summary").and_then(non_empty) {
                    let _ = write!(out, ": {summary}");
                }
                if operation.get("security").is_some() {
                    let _ = write!(out, " (requires bearer token)");
                }
                out.push('\n');
                if let Some(description) = operation.get("description").and_then(non_empty) {
                    for line in description.lines() {
                        let _ = writeln!(out, "  {line}");
                    }
                }
            }
        }
    }

    out
}

/// Create OpenAPI documentation routes
///
/// - `/api/v1/openapi.json` - OpenAPI document
/// - `/api/v1/redoc` - ReDoc documentation
/// - `/api/v1/llms.txt` - plain-text endpoint summary
pub fn create_openapi_routes() -> Router<AppState> {
    let redoc = Redoc::with_url(REDOC_PATH, ApiDoc::openapi());
    let llms_txt = render_llms_txt(&ApiDoc::openapi());

    Router::new()
        .route(OPENAPI_PATH, get(|| async { Json(ApiDoc::openapi()) }))
        .route(REDOC_PATH, get(|| async move { Html(redoc.to_html()) }))
        .route(
            LLMS_TXT_PATH,
            get(|| async move {
                (
                    [(axum::http::header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                    llms_txt,
                )
            }),
        )
}
