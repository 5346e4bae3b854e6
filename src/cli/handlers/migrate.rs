//! Migrate command handler

use crate::config::{DatabaseBackend, Settings};
use crate::db::{pending_migrations, revert_migrations, run_pending_migrations};
use crate::error::{AppError, AppResult};

pub struct MigrateCommandHandler {
    config: Settings,
}

impl MigrateCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Lists (`dry_run`), reverts (`rollback`) or applies migrations.
    ///
    /// # Errors
    /// - `Validation` when the in-memory backend is configured
    /// - Database connection and migration errors
    pub async fn execute(&self, dry_run: bool, rollback: Option<u32>) -> AppResult<()> {
        if self.config.database.backend == DatabaseBackend::Memory {
            return Err(AppError::Validation {
                field: "database.backend".to_string(),
                reason: "migrations require the postgres backend".to_string(),
            });
        }
        self.config.database.validate()?;

        let url = &self.config.database.url;
        if dry_run {
            let pending = pending_migrations(url).await?;
            if pending.is_empty() {
                println!("✓ No pending migrations - database is up to date");
            } else {
                println!("Found {} pending migration(s):", pending.len());
                for name in &pending {
                    println!("  - {}", name);
                }
                println!("\nRun without --dry-run to apply them");
            }
            return Ok(());
        }

        if let Some(steps) = rollback {
            let reverted = revert_migrations(url, steps).await?;
            tracing::warn!(count = reverted.len(), "Migrations reverted");
            println!("✓ Rolled back {} migration(s):", reverted.len());
            for version in &reverted {
                println!("  - {}", version);
            }
            return Ok(());
        }

        let applied = run_pending_migrations(url).await?;
        tracing::info!(count = applied.len(), "Migrations applied");
        if applied.is_empty() {
            println!("✓ No migrations to apply - database is up to date");
        } else {
            println!("✓ Applied {} migration(s):", applied.len());
            for version in &applied {
                println!("  - {}", version);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_is_rejected() {
        let mut config = Settings::default();
        config.database.backend = DatabaseBackend::Memory;

        match MigrateCommandHandler::new(config).execute(true, None).await {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "database.backend"),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_rollback_steps_is_rejected() {
        let mut config = Settings::default();
        config.database.url = "postgres://localhost/storefront".to_string();

        match MigrateCommandHandler::new(config).execute(false, Some(0)).await {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "rollback_steps"),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }
}
