//! Data Transfer Objects for API requests and responses.
//!
//! DTOs are organized by domain:
//! - `category`, `product`, `user` - resource request/response DTOs
//! - `error` - common error response DTO
//! - `pagination` - paging query and response wrapper
//! - `health` - health check responses

mod category;
mod error;
mod health;
mod pagination;
mod product;
mod user;

pub use category::{CategoryRequest, CategoryResponse};
pub use error::ErrorResponse;
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
pub use pagination::{PagedResponse, PaginationMeta, PaginationParams};
pub use product::{ProductRequest, ProductResponse, PurchaseResponse, SearchParams};
pub use user::{LoginRequest, LoginResponse, RegisterRequest, UserResponse};

/// Trims surrounding whitespace while deserializing, so length rules see
/// the value that will actually be stored.
pub(crate) fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = <String as serde::Deserialize>::deserialize(deserializer)?;
    Ok(value.trim().to_string())
}

/// Timestamps are stored in UTC without an offset; the API renders them as
/// RFC 3339 with millisecond precision.
pub(crate) fn format_timestamp(value: &jiff_diesel::DateTime) -> String {
    value
        .to_jiff()
        .strftime("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}
