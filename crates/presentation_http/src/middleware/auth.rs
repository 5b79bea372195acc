//! Bearer token authentication middleware
//!
//! Guards every path under a configured prefix with a single static secret.
//! With no secret configured the gate rejects everything under the prefix;
//! an unset secret never means open access. Tokens are compared in constant
//! time.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    extract::Request,
    http::header::AUTHORIZATION,
    response::{IntoResponse, Response},
};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::error::ApiError;

/// Outcome of checking one request against the configured secret
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Authorized,
    Unauthorized(&'static str),
}

/// Compare the `Authorization` header against the configured secret
pub fn check(configured: Option<&SecretString>, header: Option<&str>) -> Authorization {
    let Some(expected) = configured.filter(|s| !s.expose_secret().is_empty()) else {
        return Authorization::Unauthorized("Unauthorized");
    };

    let Some(header) = header else {
        return Authorization::Unauthorized("Missing Authorization header");
    };

    let Some(token) = bearer_token(header) else {
        return Authorization::Unauthorized("Invalid authorization format, expected Bearer token");
    };

    if bool::from(token.as_bytes().ct_eq(expected.expose_secret().as_bytes())) {
        Authorization::Authorized
    } else {
        Authorization::Unauthorized("Invalid token")
    }
}

/// Token part of `Bearer <token>`, scheme matched case-insensitively
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Secret plus the path prefix it protects
#[derive(Debug)]
pub struct BearerGate {
    token: Option<SecretString>,
    prefix: String,
}

impl BearerGate {
    pub fn new(token: Option<SecretString>, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into().trim_end_matches('/').to_string();
        if token.is_none() {
            warn!(prefix = %prefix, "No AUTH_TOKEN configured, protected routes will reject every request");
        }
        Self { token, prefix }
    }

    /// Whether `path` falls under the protected prefix
    pub fn protects(&self, path: &str) -> bool {
        path == self.prefix
            || path
                .strip_prefix(self.prefix.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// Layer that applies bearer authentication under a path prefix
#[derive(Clone, Debug)]
pub struct BearerAuthLayer {
    gate: Arc<BearerGate>,
}

impl BearerAuthLayer {
    #[must_use]
    pub fn new(token: Option<SecretString>, prefix: impl Into<String>) -> Self {
        Self {
            gate: Arc::new(BearerGate::new(token, prefix)),
        }
    }
}

impl<S> Layer<S> for BearerAuthLayer {
    type Service = BearerAuth<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BearerAuth {
            inner,
            gate: Arc::clone(&self.gate),
        }
    }
}

/// Middleware service for bearer authentication
#[derive(Clone, Debug)]
pub struct BearerAuth<S> {
    inner: S,
    gate: Arc<BearerGate>,
}

impl<S> Service<Request> for BearerAuth<S>
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
        let gate = Arc::clone(&self.gate);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if !gate.protects(req.uri().path()) {
                return inner.call(req).await;
            }

            let header = req
                .headers()
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok());

            match check(gate.token.as_ref(), header) {
                Authorization::Authorized => {
                    debug!("Bearer token accepted");
                    inner.call(req).await
                },
                Authorization::Unauthorized(reason) => {
                    debug!(reason, path = %req.uri().path(), "Bearer token rejected");
                    Ok(ApiError::Unauthorized(reason.to_string()).into_response())
                },
            }
        })
    }
}
