//! Async PostgreSQL connection pool (diesel-async over bb8).

use std::time::Duration;

use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;

use crate::config::DatabaseConfig;
use crate::error::AppError;

/// bb8::Pool is reference counted, so cloning it is cheap.
pub type AsyncDbPool = Pool<AsyncPgConnection>;

/// Builds the pool described by `config`.
///
/// bb8 opens `min_connections` eagerly, so an unreachable database fails here
/// rather than on the first request.
pub async fn establish_async_connection_pool(
    config: &DatabaseConfig,
) -> Result<AsyncDbPool, AppError> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.url.as_str());

    Pool::builder()
        .max_size(config.max_connections)
        .min_idle(Some(config.min_connections))
        .connection_timeout(Duration::from_secs(config.connection_timeout))
        .build(manager)
        .await
        .map_err(|e| AppError::ConnectionPool {
            source: anyhow::Error::from(e),
        })
}
