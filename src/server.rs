//! Server module for managing HTTP server lifecycle
//!
//! This module handles server initialization, startup, and graceful shutdown.

use crate::api::routes::create_router;
use crate::config::{DatabaseBackend, Environment, Settings};
use crate::db::{establish_async_connection_pool, run_pending_migrations};
use crate::state::AppState;
use tokio::net::TcpListener;
use tokio::signal;

/// HTTP server manager
pub struct Server {
    settings: Settings,
}

impl Server {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Builds the state for the configured backend, applying migrations first
    /// when `database.auto_migrate` is set.
    pub async fn build_state(&self) -> anyhow::Result<AppState> {
        let jwt = self.settings.jwt.clone();
        let cache = self.settings.cache.clone();
        let database = &self.settings.database;

        match database.backend {
            DatabaseBackend::Memory => {
                tracing::warn!("Using the in-memory backend; data is lost on shutdown");
                Ok(AppState::in_memory(jwt, cache))
            }
            DatabaseBackend::Postgres => {
                if database.auto_migrate {
                    let applied = run_pending_migrations(&database.url).await?;
                    tracing::info!(count = applied.len(), "Pending migrations applied");
                }

                tracing::info!(
                    max_connections = database.max_connections,
                    min_connections = database.min_connections,
                    "Initializing database connection pool"
                );
                let pool = establish_async_connection_pool(database).await?;
                Ok(AppState::new(pool, jwt, cache))
            }
        }
    }

    /// Start the server and run until shutdown signal
    ///
    /// # Errors
    /// - Invalid configuration
    /// - Migration or connection pool failures
    /// - Address binding errors
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!(
            app_name = %self.settings.application.name,
            app_version = %self.settings.application.version,
            environment = %Environment::from_env().as_str(),
            backend = %self.settings.database.backend.as_str(),
            "Application starting"
        );

        self.settings.validate().map_err(|e| {
            tracing::error!(error = %e, "Configuration validation failed");
            anyhow::anyhow!("Configuration validation failed: {}", e)
        })?;

        tracing::info!(
            expiration_hours = self.settings.jwt.expiration_hours,
            cache_seconds = self.settings.cache.default_seconds,
            swagger_ui = self.settings.server.swagger_ui,
            "Configuration loaded"
        );

        let state = self.build_state().await?;
        let router = create_router(state, &self.settings.server, &self.settings.cors);

        let address = self.settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {}: {}", address, e)
        })?;

        tracing::info!(address = %address, "Server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

/// Waits for Ctrl+C or SIGTERM.
///
/// A handler that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_builds_without_database() {
        let mut settings = Settings::default();
        settings.database.backend = DatabaseBackend::Memory;
        settings.jwt.secret = "s".repeat(32);

        let state = Server::new(settings).build_state().await.unwrap();
        assert!(state.db_pool.is_none());
        assert!(state
            .services
            .categories
            .list(crate::repositories::CategoryOrder::Name)
            .await
            .unwrap()
            .is_empty());
    }
}
