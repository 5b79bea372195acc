//! `?pretty` support
//!
//! In development a request carrying a `pretty` query parameter gets its
//! JSON response body re-indented. Non-JSON responses pass untouched.

use axum::{
    body::{Body, to_bytes},
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::debug;

fn wants_pretty(req: &Request) -> bool {
    req.uri().query().is_some_and(|query| {
        query
            .split('&')
            .any(|pair| pair.split('=').next() == Some("pretty"))
    })
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

/// `from_fn` middleware re-indenting JSON bodies on `?pretty`
pub async fn pretty_json(req: Request, next: Next) -> Response {
    let pretty = wants_pretty(&req);
    let response = next.run(req).await;
    if !pretty || !is_json(&response) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = %e, "Could not buffer response body for pretty printing");
            return Response::from_parts(parts, Body::empty());
        },
    };

    let indented = serde_json::from_slice::<serde_json::Value>(&bytes)
        .and_then(|value| serde_json::to_vec_pretty(&value));

    parts.headers.remove(header::CONTENT_LENGTH);
    match indented {
        Ok(pretty) => Response::from_parts(parts, Body::from(pretty)),
        Err(_) => Response::from_parts(parts, Body::from(bytes)),
    }
}
