//! Category request handlers.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use super::ApiVersion;
use crate::api::doc::CATEGORY_TAG;
use crate::api::dto::{CategoryRequest, CategoryResponse, ErrorResponse};
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::validate::ValidatedJson;

/// Anonymous category routes. `get_category` is mounted separately so that
/// only it carries the `Cache-Control` layer.
pub fn public_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(list_categories))
}

pub fn cacheable_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(get_category))
}

/// Routes that require the `Admin` role.
pub fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(create_category))
        .routes(routes!(update_category))
        .routes(routes!(delete_category))
}

/// GET /categories - v1 sorts by name, v2 by id
#[utoipa::path(
    get,
    path = "/",
    tag = CATEGORY_TAG,
    responses(
        (status = 200, description = "All categories", body = Vec<CategoryResponse>)
    )
)]
async fn list_categories(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
) -> AppResult<Json<Vec<CategoryResponse>>> {
    let categories = state
        .services
        .categories
        .list(version.category_order())
        .await?;
    Ok(Json(
        categories.into_iter().map(CategoryResponse::from).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = CATEGORY_TAG,
    params(
        ("id" = i32, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category found", body = CategoryResponse),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    )
)]
async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<CategoryResponse>> {
    let category = state.services.categories.get(id).await?;
    Ok(Json(CategoryResponse::from(category)))
}

#[utoipa::path(
    post,
    path = "/",
    tag = CATEGORY_TAG,
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse,
            headers(("Location" = String, description = "URL of the new category"))),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 409, description = "Name already taken", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn create_category(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    ValidatedJson(req): ValidatedJson<CategoryRequest>,
) -> AppResult<impl IntoResponse> {
    let category = state.services.categories.create(&req.name).await?;
    let location = version.location("categories", category.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(CategoryResponse::from(category)),
    ))
}

/// PATCH /categories/{id} - Rename a category
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = CATEGORY_TAG,
    params(
        ("id" = i32, Path, description = "Category ID")
    ),
    request_body = CategoryRequest,
    responses(
        (status = 204, description = "Category updated"),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Name already taken", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<CategoryRequest>,
) -> AppResult<StatusCode> {
    state.services.categories.update(id, &req.name).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = CATEGORY_TAG,
    params(
        ("id" = i32, Path, description = "Category ID")
    ),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Category still has products", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.categories.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
