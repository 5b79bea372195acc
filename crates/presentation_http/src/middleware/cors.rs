//! CORS origin negotiation
//!
//! [`parse_origins`] turns the `CORS_ORIGINS` setting into an [`OriginSet`];
//! [`CorsPolicy`] decides what a request with a given `Origin` gets back and
//! builds the `tower-http` layer that answers preflights.

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method, header, request::Parts};
use infrastructure::CorsOrigins;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::debug;

/// Wildcard entry of an origin set
pub const WILDCARD: &str = "*";

/// Preflight cache lifetime
pub const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(600);

/// Ordered, de-duplicated, never-empty list of allowed origins
///
/// Either exactly `["*"]` or literal origins only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginSet(Vec<String>);

impl OriginSet {
    /// Set that allows every origin
    pub fn any() -> Self {
        Self(vec![WILDCARD.to_string()])
    }

    fn from_entries(entries: impl IntoIterator<Item = String>) -> Self {
        let mut origins: Vec<String> = Vec::new();
        for entry in entries {
            let entry = entry.trim();
            if !entry.is_empty() && !origins.iter().any(|o| o == entry) {
                origins.push(entry.to_string());
            }
        }

        if origins.iter().any(|o| o != WILDCARD) {
            origins.retain(|o| o != WILDCARD);
        }

        if origins.is_empty() {
            Self::any()
        } else {
            Self(origins)
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.0.len() == 1 && self.0[0] == WILDCARD
    }

    pub fn contains(&self, origin: &str) -> bool {
        self.0.iter().any(|o| o == origin)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Normalize a raw allowed-origins setting
///
/// Unset or blank means any origin. Text that starts with `[` or `"` is
/// tried as JSON first; anything else (or JSON that does not parse) is
/// split on commas. Never fails.
pub fn parse_origins(raw: Option<&CorsOrigins>) -> OriginSet {
    match raw {
        None => OriginSet::any(),
        Some(CorsOrigins::List(items)) => OriginSet::from_entries(items.iter().cloned()),
        Some(CorsOrigins::Text(text)) => OriginSet::from_entries(split_text(text)),
    }
}

fn split_text(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.starts_with('[') || trimmed.starts_with('"') {
        if let Some(entries) = parse_json_origins(trimmed) {
            return entries;
        }
        debug!("CORS origins look like JSON but do not parse, splitting on commas");
    }

    trimmed.split(',').map(str::to_string).collect()
}

fn parse_json_origins(text: &str) -> Option<Vec<String>> {
    match serde_json::from_str::<serde_json::Value>(text).ok()? {
        serde_json::Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    serde_json::Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        serde_json::Value::String(s) => Some(vec![s]),
        _ => None,
    }
}

/// Outcome of CORS negotiation for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsDecision {
    /// `Access-Control-Allow-Origin` value, `None` when the origin is refused
    pub allow_origin: Option<String>,
    /// Whether `Access-Control-Allow-Credentials: true` is sent
    pub allow_credentials: bool,
}

/// CORS policy built from an origin set
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    origins: OriginSet,
}

impl CorsPolicy {
    pub const fn from_origins(origins: OriginSet) -> Self {
        Self { origins }
    }

    pub const fn origins(&self) -> &OriginSet {
        &self.origins
    }

    /// Decide the response headers for a request `Origin`
    pub fn decide(&self, origin: Option<&str>) -> CorsDecision {
        if self.origins.is_wildcard() {
            return CorsDecision {
                allow_origin: Some(WILDCARD.to_string()),
                allow_credentials: false,
            };
        }

        CorsDecision {
            allow_origin: origin
                .filter(|o| self.origins.contains(o))
                .map(str::to_string),
            allow_credentials: true,
        }
    }

    /// Layer enforcing this policy, including preflight handling
    pub fn layer(&self) -> CorsLayer {
        let layer = CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                HeaderName::from_static("x-request-id"),
            ])
            .expose_headers([HeaderName::from_static("x-request-id")])
            .max_age(PREFLIGHT_MAX_AGE);

        if self.origins.is_wildcard() {
            return layer.allow_origin(AllowOrigin::any());
        }

        let policy = self.clone();
        layer
            .allow_origin(AllowOrigin::predicate(
                move |origin: &HeaderValue, _parts: &Parts| {
                    let decision = policy.decide(origin.to_str().ok());
                    decision.allow_origin.is_some()
                },
            ))
            .allow_credentials(true)
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use tower::ServiceExt;

    use super::*;

    fn text(raw: &str) -> OriginSet {
        parse_origins(Some(&CorsOrigins::Text(raw.to_string())))
    }

    fn set(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn unset_allows_any_origin() {
        assert_eq!(parse_origins(None), OriginSet::any());
    }

    #[test]
    fn blank_text_allows_any_origin() {
        assert!(text("").is_wildcard());
        assert!(text("   ").is_wildcard());
        assert!(text(" , ,").is_wildcard());
    }

    #[test]
    fn comma_list_is_trimmed_and_deduplicated_in_order() {
        let origins = text(" https://b.com,https://a.com , https://b.com,");
        assert_eq!(origins.as_slice(), set(&["https://b.com", "https://a.com"]));
    }

    #[test]
    fn wildcard_is_dropped_next_to_literals() {
        let origins = text("https://a.com, *");
        assert_eq!(origins.as_slice(), set(&["https://a.com"]));
        assert!(!origins.is_wildcard());
    }

    #[test]
    fn json_array_is_parsed() {
        let origins = text(r#"["https://a.com", "https://b.com"]"#);
        assert_eq!(origins.as_slice(), set(&["https://a.com", "https://b.com"]));
    }

    #[test]
    fn json_array_skips_non_strings() {
        let origins = text(r#"["https://a.com", 3, null]"#);
        assert_eq!(origins.as_slice(), set(&["https://a.com"]));
    }

    #[test]
    fn json_string_literal_is_parsed() {
        let origins = text(r#""https://a.com""#);
        assert_eq!(origins.as_slice(), set(&["https://a.com"]));
    }

    #[test]
    fn empty_json_array_falls_back_to_wildcard() {
        assert!(text("[]").is_wildcard());
    }

    #[test]
    fn broken_json_falls_back_to_comma_split() {
        let origins = text("[https://a.com, https://b.com");
        assert_eq!(
            origins.as_slice(),
            set(&["[https://a.com", "https://b.com"])
        );
    }

    #[test]
    fn list_input_is_normalized() {
        let origins = parse_origins(Some(&CorsOrigins::List(set(&[
            " https://a.com ",
            "",
            "https://a.com",
            "*",
        ]))));
        assert_eq!(origins.as_slice(), set(&["https://a.com"]));
    }

    #[test]
    fn wildcard_policy_never_allows_credentials() {
        let policy = CorsPolicy::from_origins(OriginSet::any());
        let decision = policy.decide(Some("https://evil.example"));
        assert_eq!(decision.allow_origin.as_deref(), Some("*"));
        assert!(!decision.allow_credentials);
    }

    #[test]
    fn literal_policy_echoes_listed_origin_with_credentials() {
        let policy = CorsPolicy::from_origins(text("https://a.com, *"));
        let decision = policy.decide(Some("https://a.com"));
        assert_eq!(decision.allow_origin.as_deref(), Some("https://a.com"));
        assert!(decision.allow_credentials);
    }

    #[test]
    fn literal_policy_refuses_unlisted_origin() {
        let policy = CorsPolicy::from_origins(text("https://a.com"));
        assert_eq!(policy.decide(Some("https://b.com")).allow_origin, None);
        assert_eq!(policy.decide(None).allow_origin, None);
    }

    fn app(policy: &CorsPolicy) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(policy.layer())
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn preflight_for_listed_origin_is_answered() {
        let policy = CorsPolicy::from_origins(text("https://a.com"));
        let response = app(&policy)
            .oneshot(preflight("https://a.com"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://a.com"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "600");
    }

    #[tokio::test]
    async fn wildcard_response_has_no_credentials_header() {
        let policy = CorsPolicy::from_origins(OriginSet::any());
        let response = app(&policy)
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::ORIGIN, "https://anywhere.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(
            headers
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .is_none()
        );
    }

    #[tokio::test]
    async fn unlisted_origin_gets_no_allow_origin_header() {
        let policy = CorsPolicy::from_origins(text("https://a.com"));
        let response = app(&policy)
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::ORIGIN, "https://b.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }
}
