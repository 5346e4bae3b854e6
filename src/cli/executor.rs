//! Dispatches a parsed command to its handler.

use super::handlers::{MigrateCommandHandler, ServeCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::Settings;

/// Runs the command in `cli` against already merged settings.
///
/// `serve` without `--dry-run` blocks until the server shuts down.
pub async fn execute_command(cli: &Cli, settings: Settings) -> anyhow::Result<()> {
    match cli.command_or_default() {
        Commands::Serve { dry_run: true, .. } => {
            ServeCommandHandler::new(settings).validate_only()?;
        }
        Commands::Serve { .. } => {
            ServeCommandHandler::new(settings).run().await?;
        }
        Commands::Migrate { dry_run, rollback } => {
            MigrateCommandHandler::new(settings)
                .execute(dry_run, rollback)
                .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseBackend;
    use clap::Parser;

    fn memory_settings() -> Settings {
        let mut settings = Settings::default();
        settings.database.backend = DatabaseBackend::Memory;
        settings.jwt.secret = "k".repeat(32);
        settings
    }

    #[tokio::test]
    async fn test_serve_dry_run_succeeds_for_valid_settings() {
        let cli = Cli::try_parse_from(["storefront-rs", "serve", "--dry-run"]).unwrap();
        assert!(execute_command(&cli, memory_settings()).await.is_ok());
    }

    #[tokio::test]
    async fn test_migrate_rejects_memory_backend() {
        let cli = Cli::try_parse_from(["storefront-rs", "migrate"]).unwrap();
        let err = execute_command(&cli, memory_settings()).await.unwrap_err();
        assert!(err.to_string().contains("postgres"));
    }
}
