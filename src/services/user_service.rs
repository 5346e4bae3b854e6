//! User registration, login and lookup.

use std::sync::Arc;

use super::{duplicate, ensure_positive_id};
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, Role, User};
use crate::repositories::UserRepository;
use crate::utils::jwt::generate_token;
use crate::utils::password::{hash_password, verify_password};

const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Registration data after request validation.
#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub name: String,
    pub username: String,
    pub email: Option<String>,
    pub password: String,
    /// Falls back to [`Role::User`]
    pub role: Option<Role>,
}

/// A successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        self.repo.list().await
    }

    pub async fn get(&self, id: i32) -> AppResult<User> {
        ensure_positive_id(id)?;
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found_id("user", id))
    }

    /// Registers a user with an Argon2 password hash.
    ///
    /// # Errors
    /// - `BadRequest` when username or password is blank
    /// - `Duplicate` when the username is taken (ignoring case)
    pub async fn register(&self, request: RegisterUser) -> AppResult<User> {
        let username = request.username.trim().to_string();
        if username.is_empty() {
            return Err(AppError::bad_request("username is required"));
        }
        if request.password.trim().is_empty() {
            return Err(AppError::bad_request("password is required"));
        }
        if !self.repo.is_unique_username(&username).await? {
            return Err(duplicate("user", "username", &username));
        }

        let password = request.password;
        let password_hash = run_blocking(move || hash_password(&password)).await?;

        let user = self
            .repo
            .create(NewUser {
                name: request.name.trim().to_string(),
                username,
                email: request
                    .email
                    .map(|e| e.trim().to_string())
                    .filter(|e| !e.is_empty()),
                password_hash,
                role: request.role.unwrap_or_default(),
            })
            .await?;

        tracing::info!(user_id = user.id, role = %user.role, "User registered");
        Ok(user)
    }

    /// Verifies credentials and issues a signed token.
    ///
    /// Unknown users and wrong passwords fail identically with `Unauthorized`.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        secret: &str,
        expiration_hours: i64,
    ) -> AppResult<LoginOutcome> {
        if username.trim().is_empty() {
            return Err(AppError::bad_request("username is required"));
        }
        if password.is_empty() {
            return Err(AppError::bad_request("password is required"));
        }

        let Some(user) = self.repo.find_by_username(username).await? else {
            tracing::warn!(username = %username.trim(), "Login failed: unknown user");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        };

        let password = password.to_string();
        let stored_hash = user.password_hash.clone();
        let verified = run_blocking(move || verify_password(&password, &stored_hash)).await?;
        if !verified {
            tracing::warn!(user_id = user.id, "Login failed: wrong password");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        let token = generate_token(&user, secret, expiration_hours)?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok(LoginOutcome { token, user })
    }
}

/// Runs CPU-bound password work off the async executor.
async fn run_blocking<T, F>(work: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::Repositories;
    use crate::utils::jwt::validate_token;

    const SECRET: &str = "unit-test-secret-0123456789abcdef";

    fn service() -> UserService {
        UserService::new(Repositories::in_memory().users)
    }

    fn registration(username: &str, role: Option<Role>) -> RegisterUser {
        RegisterUser {
            name: "Ada Lovelace".to_string(),
            username: username.to_string(),
            email: Some("ada@example.com".to_string()),
            password: "secret123".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_register_hashes_password_and_defaults_role() {
        let service = service();
        let user = service.register(registration("ada", None)).await.unwrap();

        assert_eq!(user.role, Role::User);
        assert_ne!(user.password_hash, "secret123");
        assert!(user.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn test_register_rules() {
        let service = service();
        service
            .register(registration("ada", Some(Role::Admin)))
            .await
            .unwrap();

        assert!(matches!(
            service.register(registration(" ADA ", None)).await,
            Err(AppError::Duplicate { .. })
        ));
        assert!(matches!(
            service.register(registration("  ", None)).await,
            Err(AppError::BadRequest { .. })
        ));

        let mut blank_password = registration("grace", None);
        blank_password.password = "   ".to_string();
        assert!(matches!(
            service.register(blank_password).await,
            Err(AppError::BadRequest { .. })
        ));
    }

    #[tokio::test]
    async fn test_login_issues_token_with_role() {
        let service = service();
        let user = service
            .register(registration("ada", Some(Role::Admin)))
            .await
            .unwrap();

        let outcome = service.login("Ada", "secret123", SECRET, 2).await.unwrap();
        assert_eq!(outcome.user.id, user.id);

        let claims = validate_token(&outcome.token, SECRET).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.username, "ada");
        assert_eq!(claims.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = service();
        service.register(registration("ada", None)).await.unwrap();

        let wrong_password = service.login("ada", "nope", SECRET, 2).await.unwrap_err();
        let unknown_user = service.login("bob", "secret123", SECRET, 2).await.unwrap_err();
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert!(matches!(wrong_password, AppError::Unauthorized { .. }));

        assert!(matches!(
            service.login("", "secret123", SECRET, 2).await,
            Err(AppError::BadRequest { .. })
        ));
    }

    #[tokio::test]
    async fn test_get_user() {
        let service = service();
        let user = service.register(registration("ada", None)).await.unwrap();

        assert_eq!(service.get(user.id).await.unwrap().username, "ada");
        assert!(matches!(service.get(0).await, Err(AppError::BadRequest { .. })));
        assert_eq!(
            service.get(99).await.unwrap_err().to_string(),
            "user not found with id 99"
        );
    }
}
