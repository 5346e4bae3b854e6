//! User registration, login and administration handlers.
//!
//! Users are version-neutral; the same routes are mounted under every API
//! version.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use super::ApiVersion;
use crate::api::doc::USER_TAG;
use crate::api::dto::{ErrorResponse, LoginRequest, LoginResponse, RegisterRequest, UserResponse};
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::validate::ValidatedJson;

pub fn public_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(register))
        .routes(routes!(login))
}

pub fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_users))
        .routes(routes!(get_user))
}

/// POST /users/register - Create an account
#[utoipa::path(
    post,
    path = "/register",
    tag = USER_TAG,
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse,
            headers(("Location" = String, description = "URL of the new user"))),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Username already taken", body = ErrorResponse)
    )
)]
async fn register(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let user = state.services.users.register(req.into()).await?;
    let location = version.location("users", user.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(UserResponse::from(user)),
    ))
}

/// POST /users/login - Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/login",
    tag = USER_TAG,
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let outcome = state
        .services
        .users
        .login(
            &req.username,
            &req.password,
            &state.jwt_config.secret,
            state.jwt_config.expiration_hours,
        )
        .await?;

    Ok(Json(LoginResponse {
        token: outcome.token,
        user: UserResponse::from(outcome.user),
        message: "user logged in successfully".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/",
    tag = USER_TAG,
    responses(
        (status = 200, description = "All users", body = Vec<UserResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    let users = state.services.users.list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = USER_TAG,
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(
        ("bearerAuth" = [])
    )
)]
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<UserResponse>> {
    let user = state.services.users.get(id).await?;
    Ok(Json(UserResponse::from(user)))
}
