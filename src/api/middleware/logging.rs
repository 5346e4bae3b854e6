//! Logging middleware for request/response tracing.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{Instrument, Level, info_span};

use super::RequestId;

/// Logs each request and its outcome inside an `http_request` span tagged
/// with the request id.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let span = info_span!(
        "http_request",
        method = %method,
        path = %path,
        request_id = %request_id
    );

    async move {
        tracing::debug!("Request received");
        let start = Instant::now();
        let response = next.run(request).await;
        let duration_ms = start.elapsed().as_millis() as u64;
        let status = response.status().as_u16();

        if response.status().is_server_error() {
            tracing::event!(Level::ERROR, status, duration_ms, "Response sent");
        } else if response.status().is_client_error() {
            tracing::event!(Level::WARN, status, duration_ms, "Response sent");
        } else {
            tracing::event!(Level::INFO, status, duration_ms, "Response sent");
        }

        response
    }
    .instrument(span)
    .await
}
