//! Rate limiting middleware
//!
//! Fixed-window token bucket per client identity. A bucket starts full,
//! each admitted request takes one token, and once the window has elapsed
//! since the last refill the bucket is refilled completely on the next
//! request. There is no gradual refill.

use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::{Duration, Instant},
};

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use tokio::{sync::RwLock, task::JoinHandle};
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::error::ApiError;

/// Identity shared by every client without a proxy header
pub const UNKNOWN_CLIENT: &str = "unknown";

pub const RATE_LIMIT_LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Rate limiter configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Enable rate limiting
    pub enabled: bool,
    /// Requests admitted per window
    pub points: u32,
    /// Window length
    pub window: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            points: 100,
            window: Duration::from_secs(60),
        }
    }
}

/// Result of asking the limiter to admit one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted { remaining: u32 },
    Rejected { retry_after: Duration },
}

#[derive(Debug, Clone)]
struct RateBucket {
    tokens: u32,
    last_refill: Instant,
}

/// Shared rate limiter state
#[derive(Debug)]
pub struct RateLimiterState {
    buckets: RwLock<HashMap<String, RateBucket>>,
    capacity: u32,
    window: Duration,
}

impl RateLimiterState {
    /// Create a new rate limiter state
    #[must_use]
    pub fn new(capacity: u32, window: Duration) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            capacity,
            window,
        }
    }

    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Take one token from `client_id`'s bucket at time `now`
    pub async fn admit(&self, client_id: &str, now: Instant) -> Admission {
        let mut buckets = self.buckets.write().await;

        let bucket = buckets
            .entry(client_id.to_string())
            .or_insert_with(|| RateBucket {
                tokens: self.capacity,
                last_refill: now,
            });

        let elapsed = now.saturating_duration_since(bucket.last_refill);
        if elapsed > self.window {
            bucket.tokens = self.capacity;
            bucket.last_refill = now;
        }

        if bucket.tokens > 0 {
            bucket.tokens -= 1;
            Admission::Admitted {
                remaining: bucket.tokens,
            }
        } else {
            Admission::Rejected {
                retry_after: self.window.saturating_sub(elapsed),
            }
        }
    }

    /// Drop buckets whose window has run out, returning how many were removed
    ///
    /// An expired bucket would be refilled on its next request anyway, so
    /// removing it changes nothing a client can observe.
    pub async fn sweep(&self, now: Instant) -> usize {
        let mut buckets = self.buckets.write().await;
        let before = buckets.len();
        buckets.retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) <= self.window);
        before - buckets.len()
    }

    /// Number of tracked client identities
    pub async fn bucket_count(&self) -> usize {
        self.buckets.read().await.len()
    }
}

/// Periodically sweep expired buckets
pub fn spawn_sweep_task(state: Arc<RateLimiterState>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = state.sweep(Instant::now()).await;
            if removed > 0 {
                debug!(removed, "Swept expired rate limit buckets");
            }
        }
    })
}

/// Layer that applies rate limiting
#[derive(Clone, Debug)]
pub struct RateLimiterLayer {
    state: Arc<RateLimiterState>,
    enabled: bool,
}

impl RateLimiterLayer {
    /// Create a new rate limiter layer with its own state
    #[must_use]
    pub fn new(config: &RateLimiterConfig) -> Self {
        Self::with_state(
            config,
            Arc::new(RateLimiterState::new(config.points, config.window)),
        )
    }

    /// Create a layer over state owned elsewhere
    #[must_use]
    pub fn with_state(config: &RateLimiterConfig, state: Arc<RateLimiterState>) -> Self {
        Self {
            state,
            enabled: config.enabled,
        }
    }

    /// Get a reference to the rate limiter state for sweep tasks
    #[must_use]
    pub fn state(&self) -> Arc<RateLimiterState> {
        Arc::clone(&self.state)
    }
}

impl<S> Layer<S> for RateLimiterLayer {
    type Service = RateLimiter<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimiter {
            inner,
            state: Arc::clone(&self.state),
            enabled: self.enabled,
        }
    }
}

/// Middleware service for rate limiting
#[derive(Clone, Debug)]
pub struct RateLimiter<S> {
    inner: S,
    state: Arc<RateLimiterState>,
    enabled: bool,
}

impl<S> Service<Request> for RateLimiter<S>
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
        let enabled = self.enabled;
        let state = Arc::clone(&self.state);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if !enabled {
                return inner.call(req).await;
            }

            let client_id = client_identity(req.headers());

            match state.admit(&client_id, Instant::now()).await {
                Admission::Admitted { remaining } => {
                    let mut response = inner.call(req).await?;
                    let headers = response.headers_mut();
                    headers.insert(
                        RATE_LIMIT_LIMIT_HEADER,
                        HeaderValue::from(state.capacity()),
                    );
                    headers.insert(RATE_LIMIT_REMAINING_HEADER, HeaderValue::from(remaining));
                    Ok(response)
                },
                Admission::Rejected { retry_after } => {
                    warn!(client = %client_id, "Rate limit exceeded");
                    Ok(ApiError::rate_limited(retry_after).into_response())
                },
            }
        })
    }
}

/// Client identity: `cf-connecting-ip`, then the first `x-forwarded-for`
/// entry, then [`UNKNOWN_CLIENT`]
///
/// Clients without either header all share the `"unknown"` bucket.
pub fn client_identity(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(ip) = header("cf-connecting-ip") {
        return ip.to_string();
    }

    header("x-forwarded-for")
        .and_then(|forwarded| forwarded.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Body, http::StatusCode, routing::get};
    use tower::ServiceExt;

    use super::*;

    async fn test_handler() -> &'static str {
        "ok"
    }

    fn create_test_router(enabled: bool, points: u32) -> Router {
        let config = RateLimiterConfig {
            enabled,
            points,
            ..RateLimiterConfig::default()
        };
        Router::new()
            .route("/test", get(test_handler))
            .layer(RateLimiterLayer::new(&config))
    }

    fn request_from(ip: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/test");
        if let Some(ip) = ip {
            builder = builder.header("x-forwarded-for", ip);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn hundred_admitted_then_rejected_then_reset_after_window() {
        let state = RateLimiterState::new(100, Duration::from_secs(60));
        let start = Instant::now();

        for i in 0..100 {
            let admission = state.admit("X", start).await;
            assert_eq!(admission, Admission::Admitted { remaining: 99 - i });
        }

        let Admission::Rejected { retry_after } = state.admit("X", start).await else {
            unreachable!("101st request must be rejected");
        };
        assert!(retry_after > Duration::ZERO);
        let err = ApiError::rate_limited(retry_after);
        assert!(matches!(err, ApiError::RateLimited { retry_after_secs: 60 }));

        let later = start + Duration::from_secs(61);
        assert_eq!(
            state.admit("X", later).await,
            Admission::Admitted { remaining: 99 }
        );
    }

    #[tokio::test]
    async fn retry_after_counts_down_within_the_window() {
        let state = RateLimiterState::new(1, Duration::from_secs(60));
        let start = Instant::now();
        state.admit("X", start).await;

        let admission = state.admit("X", start + Duration::from_secs(45)).await;
        assert_eq!(
            admission,
            Admission::Rejected {
                retry_after: Duration::from_secs(15)
            }
        );
    }

    #[tokio::test]
    async fn exactly_one_window_later_is_still_limited() {
        let state = RateLimiterState::new(1, Duration::from_secs(60));
        let start = Instant::now();
        state.admit("X", start).await;

        let admission = state.admit("X", start + Duration::from_secs(60)).await;
        assert!(matches!(admission, Admission::Rejected { .. }));
    }

    #[tokio::test]
    async fn clients_have_separate_buckets() {
        let state = RateLimiterState::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert!(matches!(
            state.admit("a", now).await,
            Admission::Admitted { .. }
        ));
        assert!(matches!(
            state.admit("b", now).await,
            Admission::Admitted { .. }
        ));
        assert!(matches!(
            state.admit("a", now).await,
            Admission::Rejected { .. }
        ));
    }

    #[tokio::test]
    async fn zero_capacity_rejects_everything() {
        let state = RateLimiterState::new(0, Duration::from_secs(60));
        assert!(matches!(
            state.admit("a", Instant::now()).await,
            Admission::Rejected { .. }
        ));
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_buckets() {
        let state = RateLimiterState::new(5, Duration::from_secs(60));
        let start = Instant::now();
        state.admit("old", start).await;
        state.admit("fresh", start + Duration::from_secs(30)).await;

        let removed = state.sweep(start + Duration::from_secs(70)).await;
        assert_eq!(removed, 1);
        assert_eq!(state.bucket_count().await, 1);
    }

    #[test]
    fn identity_prefers_cloudflare_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1"));
        headers.insert("cf-connecting-ip", HeaderValue::from_static("203.0.113.9"));
        assert_eq!(client_identity(&headers), "203.0.113.9");
    }

    #[test]
    fn identity_uses_first_forwarded_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static(" 198.51.100.7 , 10.0.0.1"),
        );
        assert_eq!(client_identity(&headers), "198.51.100.7");
    }

    #[test]
    fn identity_falls_back_to_unknown() {
        assert_eq!(client_identity(&HeaderMap::new()), UNKNOWN_CLIENT);

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(""));
        assert_eq!(client_identity(&headers), UNKNOWN_CLIENT);
    }

    #[tokio::test]
    async fn rate_limit_disabled_passes_all_requests() {
        let app = create_test_router(false, 1);

        for _ in 0..10 {
            let response = app.clone().oneshot(request_from(None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn admitted_responses_report_quota() {
        let app = create_test_router(true, 5);
        let response = app.oneshot(request_from(Some("1.2.3.4"))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[RATE_LIMIT_LIMIT_HEADER], "5");
        assert_eq!(response.headers()[RATE_LIMIT_REMAINING_HEADER], "4");
    }

    #[tokio::test]
    async fn excess_requests_get_rate_limited_envelope() {
        let app = create_test_router(true, 2);

        for _ in 0..2 {
            let response = app.clone().oneshot(request_from(None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app.clone().oneshot(request_from(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key("retry-after"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"]["code"], "RATE_LIMITED");
        assert!(json["meta"]["retryAfter"].as_u64().unwrap() > 0);

        let other = app.oneshot(request_from(Some("9.9.9.9"))).await.unwrap();
        assert_eq!(other.status(), StatusCode::OK);
    }
}
