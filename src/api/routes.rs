//! Router configuration for the API.
//!
//! Resources are mounted twice, under `/api/v1` and `/api/v2`. Each version
//! carries an [`ApiVersion`] extension that handlers read for ordering and
//! `Location` headers.

use std::time::Duration;

use axum::{
    Extension, Router,
    http::{HeaderValue, Method, StatusCode, header},
    middleware,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::doc::ApiDoc;
use crate::api::handlers::{self, ApiVersion};
use crate::api::middleware::{
    REQUEST_ID_HEADER, auth_middleware, cache_control_middleware, global_error_handler,
    logging_middleware, request_id_middleware, require_admin,
};
use crate::config::{CorsConfig, ServerConfig};
use crate::state::AppState;

/// Requires a valid bearer token.
fn authenticated(router: OpenApiRouter<AppState>, state: &AppState) -> OpenApiRouter<AppState> {
    router.route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth_middleware,
    ))
}

/// Requires a valid bearer token carrying the `Admin` role.
fn admin_only(router: OpenApiRouter<AppState>, state: &AppState) -> OpenApiRouter<AppState> {
    // route_layer runs the last added layer first, so authentication precedes the role check
    authenticated(router.route_layer(middleware::from_fn(require_admin)), state)
}

// Protected routers are merged first: on a shared path the fallback of the
// last merged router answers unsupported methods, and that one must not
// demand a token.
fn versioned_routes(state: &AppState, version: ApiVersion) -> OpenApiRouter<AppState> {
    let categories = admin_only(handlers::categories::admin_routes(), state)
        .merge(
            handlers::categories::cacheable_routes().route_layer(
                middleware::from_fn_with_state(state.clone(), cache_control_middleware),
            ),
        )
        .merge(handlers::categories::public_routes());

    let products = admin_only(handlers::products::admin_routes(), state)
        .merge(authenticated(handlers::products::customer_routes(), state))
        .merge(handlers::products::public_routes());

    let users = admin_only(handlers::users::admin_routes(), state)
        .merge(handlers::users::public_routes());

    OpenApiRouter::new()
        .nest("/categories", categories)
        .nest("/products", products)
        .nest("/users", users)
        .layer(Extension(version))
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .expose_headers([header::LOCATION, header::HeaderName::from_static(REQUEST_ID_HEADER)])
        .max_age(Duration::from_secs(3600));

    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(%origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Builds the API router with all resources and middleware.
///
/// # Middleware Order
/// Layers run outermost first:
/// 1. CORS
/// 2. Timeout
/// 3. Compression
/// 4. Request ID - generates or propagates `x-request-id`
/// 5. Logging - logs requests with their id
/// 6. Global error handler - turns every error into an `ErrorResponse`
///
/// # Example
/// ```ignore
/// let state = AppState::in_memory(settings.jwt.clone(), settings.cache.clone());
/// let router = create_router(state, &settings.server, &settings.cors);
/// ```
pub fn create_router(state: AppState, server: &ServerConfig, cors: &CorsConfig) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(handlers::health::health_routes())
        .nest("/api/v1", versioned_routes(&state, ApiVersion::V1))
        .nest("/api/v2", versioned_routes(&state, ApiVersion::V2))
        .split_for_parts();

    let router = if server.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api))
    } else {
        router
    };

    router
        .layer(middleware::from_fn(global_error_handler))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(server.request_timeout),
        ))
        .layer(cors_layer(cors))
        .with_state(state)
}
