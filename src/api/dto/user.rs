//! User and authentication DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::trimmed;
use crate::models::{Role, User};
use crate::services::RegisterUser;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(max = 100, message = "Name cannot exceed 100 characters"))]
    #[schema(example = "Ada Lovelace")]
    pub name: String,

    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))]
    #[schema(example = "ada")]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "ada@example.com")]
    pub email: Option<String>,

    #[validate(length(min = 6, max = 100, message = "Password must be between 6 and 100 characters"))]
    #[schema(example = "secret123", format = Password)]
    pub password: String,

    /// Defaults to `User`
    pub role: Option<Role>,
}

impl From<RegisterRequest> for RegisterUser {
    fn from(request: RegisterRequest) -> Self {
        Self {
            name: request.name,
            username: request.username,
            email: request.email,
            password: request.password,
            role: request.role,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "Username is required"))]
    #[schema(example = "ada")]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "secret123", format = Password)]
    pub password: String,
}

/// Public view of a user; the password hash never leaves the service.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub username: String,
    pub email: Option<String>,
    pub role: Role,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// HS256 bearer token
    pub token: String,
    pub user: UserResponse,
    #[schema(example = "user logged in successfully")]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_rules() {
        let request: RegisterRequest =
            serde_json::from_str(r#"{"username":"ada","password":"secret123"}"#).unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.role, None);

        let request: RegisterRequest = serde_json::from_str(
            r#"{"username":"ad","password":"123","email":"nope","role":"Admin"}"#,
        )
        .unwrap();
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("email"));
        assert_eq!(request.role, Some(Role::Admin));
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let result: Result<RegisterRequest, _> =
            serde_json::from_str(r#"{"username":"ada","password":"secret123","role":"Root"}"#);
        assert!(result.is_err());
    }
}
