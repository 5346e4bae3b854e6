//! Serve command handler

use crate::config::{DatabaseBackend, Settings};
use crate::error::AppResult;
use crate::server::Server;

pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Starts the server and runs until a shutdown signal arrives.
    pub async fn run(self) -> anyhow::Result<()> {
        Server::new(self.config).run().await
    }

    /// Validates the configuration and prints what the server would do.
    pub fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;

        println!("✓ Configuration is valid");
        println!("✓ Server would bind to: {}", self.config.server.address());
        match self.config.database.backend {
            DatabaseBackend::Postgres => println!(
                "✓ Database backend: postgres (auto_migrate = {})",
                self.config.database.auto_migrate
            ),
            DatabaseBackend::Memory => println!("✓ Database backend: memory"),
        }
        println!(
            "✓ Tokens expire after {} hour(s)",
            self.config.jwt.expiration_hours
        );
        if self.config.server.swagger_ui {
            println!("✓ Swagger UI at /swagger-ui");
        }

        println!("Dry run completed successfully");
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Settings {
        let mut config = Settings::default();
        config.database.url = "postgres://localhost/storefront".to_string();
        config.jwt.secret = "k".repeat(32);
        config
    }

    #[test]
    fn test_dry_run_accepts_valid_config() {
        let handler = ServeCommandHandler::new(valid_config());
        assert!(handler.validate_only().is_ok());
        assert_eq!(handler.config().server.port, valid_config().server.port);
    }

    #[test]
    fn test_dry_run_rejects_invalid_config() {
        let mut config = valid_config();
        config.server.port = 0;
        assert!(ServeCommandHandler::new(config).validate_only().is_err());
    }
}
