use jiff::Timestamp;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::{Role, User};

const SECONDS_PER_HOUR: i64 = 3600;

/// JWT claims identifying a user and their role
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub username: String,
    pub role: Role,
    /// Issued at (seconds since the Unix epoch)
    pub iat: i64,
    /// Expiration time (seconds since the Unix epoch)
    pub exp: i64,
}

impl Claims {
    /// Creates claims valid for `expiration_hours` from now.
    ///
    /// A negative duration yields an already expired token, which tests rely on.
    ///
    /// # Errors
    /// `Internal` when the expiry does not fit in a Unix timestamp.
    pub fn new(
        user_id: i32,
        username: String,
        role: Role,
        expiration_hours: i64,
    ) -> AppResult<Self> {
        let now = Timestamp::now().as_second();
        let exp = expiration_hours
            .checked_mul(SECONDS_PER_HOUR)
            .and_then(|lifetime| now.checked_add(lifetime))
            .ok_or_else(|| AppError::Internal {
                source: anyhow::anyhow!(
                    "Token lifetime of {} hours overflows the expiry timestamp",
                    expiration_hours
                ),
            })?;

        Ok(Self {
            sub: user_id.to_string(),
            username,
            role,
            iat: now,
            exp,
        })
    }

    /// The numeric user id carried in `sub`.
    pub fn user_id(&self) -> AppResult<i32> {
        self.sub
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid token subject"))
    }
}

/// Signs an HS256 token for `user`.
///
/// # Example
/// ```ignore
/// let token = generate_token(&user, &settings.jwt.secret, settings.jwt.expiration_hours)?;
/// ```
pub fn generate_token(user: &User, secret: &str, expiration_hours: i64) -> AppResult<String> {
    let claims = Claims::new(user.id, user.username.clone(), user.role, expiration_hours)?;

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal {
        source: anyhow::anyhow!("Failed to generate JWT token: {}", e),
    })
}

/// Validates the signature and expiry of `token` and returns its claims.
pub fn validate_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::unauthorized("Token has expired"),
        ErrorKind::InvalidSignature => AppError::unauthorized("Invalid token signature"),
        ErrorKind::InvalidToken => AppError::unauthorized("Invalid token"),
        _ => AppError::unauthorized(format!("Token validation failed: {}", e)),
    })
}
