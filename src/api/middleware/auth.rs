//! JWT authentication and role authorization middleware.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::Role;
use crate::state::AppState;
use crate::utils::jwt::{Claims, validate_token};

/// Authenticated caller, added to request extensions by [`auth_middleware`].
///
/// Extract it in handlers with `Extension<AuthUser>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
}

impl TryFrom<Claims> for AuthUser {
    type Error = AppError;

    fn try_from(claims: Claims) -> AppResult<Self> {
        Ok(Self {
            user_id: claims.user_id()?,
            username: claims.username,
            role: claims.role,
        })
    }
}

fn bearer_token(request: &Request) -> AppResult<&str> {
    let value = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?
        .to_str()
        .map_err(|_| AppError::unauthorized("Invalid authorization header"))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AppError::unauthorized("Invalid authorization header format. Expected: Bearer <token>")
        })
}

/// Requires `Authorization: Bearer <token>` with a valid, unexpired token.
///
/// # Example
/// ```ignore
/// OpenApiRouter::new()
///     .routes(routes!(buy_product))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
/// ```
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = validate_token(bearer_token(&request)?, &state.jwt_config.secret)?;
    let auth_user = AuthUser::try_from(claims)?;

    tracing::debug!(user_id = auth_user.user_id, role = %auth_user.role, "Request authenticated");
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Lets only `Admin` callers through. Must run after [`auth_middleware`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| AppError::unauthorized("Authentication required"))?;

    if !user.role.is_admin() {
        tracing::warn!(user_id = user.user_id, path = %request.uri().path(), "Admin role required");
        return Err(AppError::forbidden("Admin role required"));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn claims(sub: &str, role: Role) -> Claims {
        Claims {
            sub: sub.to_string(),
            username: "ada".to_string(),
            role,
            iat: 0,
            exp: 9_999_999_999,
        }
    }

    fn request_with(header_value: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/");
        if let Some(value) = header_value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_auth_user_from_claims() {
        let user = AuthUser::try_from(claims("12", Role::Admin)).unwrap();
        assert_eq!(user.user_id, 12);
        assert_eq!(user.role, Role::Admin);
        assert!(AuthUser::try_from(claims("twelve", Role::User)).is_err());
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&request_with(Some("Bearer abc"))).unwrap(), "abc");
        assert!(bearer_token(&request_with(None)).is_err());
        assert!(bearer_token(&request_with(Some("Basic abc"))).is_err());
        assert!(bearer_token(&request_with(Some("Bearer   "))).is_err());
    }
}
