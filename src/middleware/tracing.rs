//! Request logging with a per-request id

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use super::rate_limiter::client_key;

static REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Log each request once on completion; echoes or assigns `x-request-id`
pub async fn request_tracing(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let client = client_key(request.headers());
    let request_id = request
        .headers()
        .get(&REQUEST_ID)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = tracing::info_span!("request", id = %request_id, method = %method, path = %path);
    let start = Instant::now();
    let mut response = next.run(request).instrument(span.clone()).await;
    let status = response.status().as_u16();
    let duration_ms = start.elapsed().as_millis() as u64;

    let _entered = span.enter();
    if response.status().is_server_error() {
        tracing::error!(status, duration_ms, client = %client, "Request failed");
    } else if response.status().is_client_error() {
        tracing::warn!(status, duration_ms, client = %client, "Request rejected");
    } else {
        tracing::info!(status, duration_ms, "Request completed");
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID.clone(), value);
    }
    response
}
