//! Security headers middleware
//!
//! Adds hardening headers to every response plus `X-Powered-By` with the
//! configured server name.
//!
//! - `X-Content-Type-Options: nosniff`
//! - `X-Frame-Options: DENY`
//! - `Referrer-Policy: no-referrer`
//! - `Content-Security-Policy` locking everything down (JSON responses only;
//!   the HTML API reference needs to load its script)
//! - `Permissions-Policy` disabling powerful browser features
//! - `Cache-Control: no-store` unless the handler set one

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, header},
    response::Response,
};
use tower::{Layer, Service};
use tracing::warn;

const CONTENT_SECURITY_POLICY: &str = "default-src 'none'; frame-ancestors 'none'; base-uri 'none'";

const PERMISSIONS_POLICY: &str = "accelerometer=(), camera=(), geolocation=(), gyroscope=(), \
                                  magnetometer=(), microphone=(), payment=(), usb=()";

const STATIC_HEADERS: [(&str, &str); 4] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "no-referrer"),
    ("permissions-policy", PERMISSIONS_POLICY),
];

/// Layer that adds security headers to all responses
#[derive(Clone, Debug, Default)]
pub struct SecurityHeadersLayer {
    powered_by: Option<HeaderValue>,
}

impl SecurityHeadersLayer {
    /// Create a new security headers layer announcing `server_name`
    #[must_use]
    pub fn new(server_name: &str) -> Self {
        let powered_by = HeaderValue::from_str(server_name)
            .inspect_err(|_| warn!(server_name, "SERVER_NAME is not a valid header value, omitting X-Powered-By"))
            .ok()
            .filter(|v| !v.is_empty());
        Self { powered_by }
    }
}

impl<S> Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeaders<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityHeaders {
            inner,
            powered_by: self.powered_by.clone(),
        }
    }
}

/// Middleware service that adds security headers
#[derive(Clone, Debug)]
pub struct SecurityHeaders<S> {
    inner: S,
    powered_by: Option<HeaderValue>,
}

impl<S> Service<Request> for SecurityHeaders<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let mut inner = self.inner.clone();
        let powered_by = self.powered_by.clone();

        Box::pin(async move {
            let mut response = inner.call(req).await?;
            let headers = response.headers_mut();

            for (name, value) in STATIC_HEADERS {
                headers.insert(
                    HeaderName::from_static(name),
                    HeaderValue::from_static(value),
                );
            }

            let is_html = headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|ct| ct.starts_with("text/html"));
            if !is_html {
                headers.insert(
                    header::CONTENT_SECURITY_POLICY,
                    HeaderValue::from_static(CONTENT_SECURITY_POLICY),
                );
            }

            if !headers.contains_key(header::CACHE_CONTROL) {
                headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
            }

            if let Some(value) = powered_by {
                headers.insert(HeaderName::from_static("x-powered-by"), value);
            }

            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Body, response::Html, routing::get};
    use tower::ServiceExt;

    use super::*;

    async fn test_handler() -> &'static str {
        "ok"
    }

    async fn send(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    fn app(server_name: &str) -> Router {
        Router::new()
            .route("/test", get(test_handler))
            .route("/page", get(|| async { Html("<p>hi</p>") }))
            .layer(SecurityHeadersLayer::new(server_name))
    }

    #[tokio::test]
    async fn all_security_headers_present() {
        let response = send(app("API Starter"), "/test").await;
        let headers = response.headers();

        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["referrer-policy"], "no-referrer");
        assert_eq!(headers["content-security-policy"], CONTENT_SECURITY_POLICY);
        assert!(headers.contains_key("permissions-policy"));
        assert_eq!(headers["cache-control"], "no-store");
        assert_eq!(headers["x-powered-by"], "API Starter");
    }

    #[tokio::test]
    async fn html_pages_skip_content_security_policy() {
        let response = send(app("API Starter"), "/page").await;
        assert!(!response.headers().contains_key("content-security-policy"));
        assert!(response.headers().contains_key("x-frame-options"));
    }

    #[tokio::test]
    async fn preserves_existing_cache_control() {
        async fn handler_with_cache() -> ([(HeaderName, &'static str); 1], &'static str) {
            ([(header::CACHE_CONTROL, "public, max-age=3600")], "cached response")
        }

        let app = Router::new()
            .route("/test", get(handler_with_cache))
            .layer(SecurityHeadersLayer::new("x"));

        let response = send(app, "/test").await;
        assert_eq!(response.headers()["cache-control"], "public, max-age=3600");
    }

    #[tokio::test]
    async fn blank_server_name_omits_powered_by() {
        let response = send(app(""), "/test").await;
        assert!(!response.headers().contains_key("x-powered-by"));
    }
}
