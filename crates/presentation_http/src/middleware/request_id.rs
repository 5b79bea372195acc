//! Request ID middleware for HTTP request correlation
//!
//! Reuses a well-formed incoming `X-Request-Id` or generates a UUID v7,
//! makes it available to handlers (extensions and [`current_request_id`]),
//! records it on the tracing span, and echoes it on the response.

use axum::{body::Body, extract::Request, http::header::HeaderValue, response::Response};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

/// The header name for the request ID
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

const MAX_REQUEST_ID_LEN: usize = 255;

tokio::task_local! {
    static REQUEST_ID: RequestId;
}

/// Request id of the request being served on this task, if any
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|id| id.0.clone()).ok()
}

/// Layer that adds request ID handling to HTTP services
#[derive(Debug, Clone, Default)]
pub struct RequestIdLayer;

impl RequestIdLayer {
    /// Create a new request ID layer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

/// Service that extracts or generates a request ID for each request
#[derive(Debug, Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for RequestIdService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(RequestId::parse)
            .unwrap_or_else(RequestId::generate);

        request.extensions_mut().insert(request_id.clone());

        let span = tracing::info_span!(
            "http_request",
            request_id = %request_id,
            method = %request.method(),
            uri = %request.uri().path(),
        );

        let mut inner = self.inner.clone();
        let header_value = HeaderValue::from_str(request_id.as_str()).ok();

        Box::pin(
            REQUEST_ID.scope(
                request_id,
                async move {
                    let mut response = inner.call(request).await?;

                    if let Some(value) = header_value {
                        response.headers_mut().insert(REQUEST_ID_HEADER, value);
                    }

                    Ok(response)
                }
                .instrument(span),
            ),
        )
    }
}

/// Request ID taken from the request headers or generated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// Accept a client-supplied id: 1 to 255 characters of `[A-Za-z0-9_=-]`
    pub fn parse(value: &str) -> Option<Self> {
        let well_formed = !value.is_empty()
            && value.len() <= MAX_REQUEST_ID_LEN
            && value
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'='));
        well_formed.then(|| Self(value.to_string()))
    }

    /// Fresh time-ordered id
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
