//! `Cache-Control` headers for cacheable reads.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method, header},
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Marks successful GET responses as publicly cacheable for
/// `cache.default_seconds`. A duration of zero sends `no-store`.
pub async fn cache_control_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let cacheable = request.method() == Method::GET;
    let mut response = next.run(request).await;

    if cacheable && response.status().is_success() {
        let value = cache_header_value(state.cache_config.default_seconds);
        response.headers_mut().insert(header::CACHE_CONTROL, value);
    }

    response
}

fn cache_header_value(seconds: u32) -> HeaderValue {
    if seconds == 0 {
        return HeaderValue::from_static("no-store");
    }
    HeaderValue::from_str(&format!("public, max-age={}", seconds))
        .unwrap_or_else(|_| HeaderValue::from_static("no-store"))
}
