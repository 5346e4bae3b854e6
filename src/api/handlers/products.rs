//! Product request handlers.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use super::ApiVersion;
use crate::api::doc::PRODUCT_TAG;
use crate::api::dto::{
    ErrorResponse, PagedResponse, PaginationParams, ProductRequest, ProductResponse,
    PurchaseResponse, SearchParams,
};
use crate::api::middleware::AuthUser;
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::validate::{ValidatedJson, ValidatedQuery};

pub fn public_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_products))
        .routes(routes!(get_product))
        .routes(routes!(list_products_by_category))
        .routes(routes!(search_products))
}

/// Routes open to any authenticated user.
pub fn customer_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(buy_product))
}

pub fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(create_product))
        .routes(routes!(update_product))
        .routes(routes!(delete_product))
}

fn to_responses(items: Vec<crate::models::ProductWithCategory>) -> Vec<ProductResponse> {
    items.into_iter().map(ProductResponse::from).collect()
}

/// GET /products
///
/// Without `page`/`page_size` the full catalogue is returned ordered by name.
/// With either of them the response is a page ordered by id.
#[utoipa::path(
    get,
    path = "/",
    tag = PRODUCT_TAG,
    params(PaginationParams),
    responses(
        (status = 200, description = "Product list, or a page when paging parameters are given",
            body = PagedResponse<ProductResponse>),
        (status = 400, description = "Invalid paging parameters", body = ErrorResponse)
    )
)]
async fn list_products(
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<PaginationParams>,
) -> AppResult<Response> {
    let products = &state.services.products;

    if !params.is_requested() {
        let items = products.list().await?;
        return Ok(Json(to_responses(items)).into_response());
    }

    let (items, total) = products
        .list_paginated(params.page(), params.page_size())
        .await?;
    Ok(Json(PagedResponse::new(to_responses(items), &params, total)).into_response())
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = PRODUCT_TAG,
    params(
        ("id" = i32, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    )
)]
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ProductResponse>> {
    let product = state.services.products.get(id).await?;
    Ok(Json(ProductResponse::from(product)))
}

/// GET /products/category/{category_id} - Empty list for unknown categories
#[utoipa::path(
    get,
    path = "/category/{category_id}",
    tag = PRODUCT_TAG,
    params(
        ("category_id" = i32, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Products of the category", body = Vec<ProductResponse>)
    )
)]
async fn list_products_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<i32>,
) -> AppResult<Json<Vec<ProductResponse>>> {
    let items = state.services.products.list_by_category(category_id).await?;
    Ok(Json(to_responses(items)))
}

#[utoipa::path(
    get,
    path = "/search",
    tag = PRODUCT_TAG,
    params(SearchParams),
    responses(
        (status = 200, description = "Matching products", body = Vec<ProductResponse>),
        (status = 400, description = "Invalid search term", body = ErrorResponse)
    )
)]
async fn search_products(
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<SearchParams>,
) -> AppResult<Json<Vec<ProductResponse>>> {
    let items = state.services.products.search(&params.term).await?;
    Ok(Json(to_responses(items)))
}

/// PATCH /products/buy/{name}/{quantity} - Decrement stock by `quantity`
#[utoipa::path(
    patch,
    path = "/buy/{name}/{quantity}",
    tag = PRODUCT_TAG,
    params(
        ("name" = String, Path, description = "Product name, matched case-insensitively"),
        ("quantity" = i32, Path, description = "Units to buy, at least 1")
    ),
    responses(
        (status = 200, description = "Purchase completed", body = PurchaseResponse),
        (status = 400, description = "Invalid quantity or insufficient stock", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn buy_product(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((name, quantity)): Path<(String, i32)>,
) -> AppResult<Json<PurchaseResponse>> {
    let product = state.services.products.buy(&name, quantity).await?;
    tracing::info!(
        user_id = user.user_id,
        product_id = product.id,
        quantity,
        "Product purchased"
    );
    Ok(Json(PurchaseResponse::new(product, quantity)))
}

#[utoipa::path(
    post,
    path = "/",
    tag = PRODUCT_TAG,
    request_body = ProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse,
            headers(("Location" = String, description = "URL of the new product"))),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Name already taken", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn create_product(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    ValidatedJson(req): ValidatedJson<ProductRequest>,
) -> AppResult<impl IntoResponse> {
    let product = state
        .services
        .products
        .create(req.into_new_product())
        .await?;
    let location = version.location("products", product.product.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(ProductResponse::from(product)),
    ))
}

/// PUT /products/{id} - Replace every editable field
#[utoipa::path(
    put,
    path = "/{id}",
    tag = PRODUCT_TAG,
    params(
        ("id" = i32, Path, description = "Product ID")
    ),
    request_body = ProductRequest,
    responses(
        (status = 204, description = "Product updated"),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Product or category not found", body = ErrorResponse),
        (status = 409, description = "Name already taken", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<ProductRequest>,
) -> AppResult<StatusCode> {
    state
        .services
        .products
        .update(id, req.into_update_product())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = PRODUCT_TAG,
    params(
        ("id" = i32, Path, description = "Product ID")
    ),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.products.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
