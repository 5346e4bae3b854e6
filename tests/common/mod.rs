#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use storefront_rs::AppState;
use storefront_rs::api::routes::create_router;
use storefront_rs::config::{CacheConfig, CorsConfig, JwtConfig, ServerConfig};

pub const JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const CACHE_SECONDS: u32 = 30;

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Full router over a fresh in-memory store.
pub fn app() -> Router {
    let state = AppState::in_memory(
        JwtConfig {
            secret: JWT_SECRET.to_string(),
            expiration_hours: 2,
        },
        CacheConfig {
            default_seconds: CACHE_SECONDS,
        },
    );
    create_router(state, &ServerConfig::default(), &CorsConfig::default())
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).to_string())
        })
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    send(app, Method::GET, uri, None, None).await
}

/// Registers `username` with `role` (None for the default) and returns a token.
pub async fn login_as(app: &Router, username: &str, role: Option<&str>) -> String {
    let mut body = json!({ "username": username, "password": "secret123" });
    if let Some(role) = role {
        body["role"] = json!(role);
    }
    let registered = send(app, Method::POST, "/api/v1/users/register", None, Some(body)).await;
    assert_eq!(registered.status, StatusCode::CREATED, "{}", registered.body);

    let login = send(
        app,
        Method::POST,
        "/api/v1/users/login",
        None,
        Some(json!({ "username": username, "password": "secret123" })),
    )
    .await;
    assert_eq!(login.status, StatusCode::OK, "{}", login.body);
    login.body["token"].as_str().unwrap().to_string()
}

pub async fn admin_token(app: &Router) -> String {
    login_as(app, "admin", Some("Admin")).await
}

pub async fn create_category(app: &Router, token: &str, name: &str) -> i64 {
    let response = send(
        app,
        Method::POST,
        "/api/v1/categories",
        Some(token),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body["id"].as_i64().unwrap()
}

pub fn product_body(name: &str, price: &str, stock: i32, category_id: i64) -> Value {
    json!({
        "name": name,
        "description": format!("{} description", name),
        "price": price,
        "sku": format!("SKU-{}", name.to_uppercase()),
        "stock": stock,
        "category_id": category_id,
    })
}

pub async fn create_product(
    app: &Router,
    token: &str,
    name: &str,
    stock: i32,
    category_id: i64,
) -> i64 {
    let response = send(
        app,
        Method::POST,
        "/api/v1/products",
        Some(token),
        Some(product_body(name, "10.00", stock, category_id)),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body["id"].as_i64().unwrap()
}
