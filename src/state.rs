//! Application state for Axum web framework.
//!
//! Contains shared services and resources that are accessible
//! across all request handlers.

use crate::config::{CacheConfig, JwtConfig};
use crate::db::AsyncDbPool;
use crate::repositories::Repositories;
use crate::services::Services;

/// Application state containing all shared services and resources.
///
/// Cloning is cheap since both Services and AsyncDbPool use Arc internally.
#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
    /// Present only for the postgres backend; used by the health check
    pub db_pool: Option<AsyncDbPool>,
    /// JWT configuration for token generation and validation
    pub jwt_config: JwtConfig,
    pub cache_config: CacheConfig,
}

impl AppState {
    /// Creates a state backed by PostgreSQL.
    ///
    /// # Example
    /// ```ignore
    /// let pool = establish_async_connection_pool(&settings.database).await?;
    /// let state = AppState::new(pool, settings.jwt.clone(), settings.cache.clone());
    /// ```
    pub fn new(pool: AsyncDbPool, jwt_config: JwtConfig, cache_config: CacheConfig) -> Self {
        let services = Services::new(Repositories::postgres(pool.clone()));
        Self {
            services,
            db_pool: Some(pool),
            jwt_config,
            cache_config,
        }
    }

    /// Creates a state backed by the process-local in-memory store.
    pub fn in_memory(jwt_config: JwtConfig, cache_config: CacheConfig) -> Self {
        Self {
            services: Services::new(Repositories::in_memory()),
            db_pool: None,
            jwt_config,
            cache_config,
        }
    }
}
