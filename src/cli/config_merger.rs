//! Applies command-line overrides on top of file and environment configuration.
//!
//! Precedence, lowest first: config files, `STOREFRONT_*` variables, global
//! flags (`--verbose`/`--quiet`), then command flags.

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Settings};

pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Loads the base configuration the way `cli` asks for (`--config`,
    /// `--env`) without validating it yet.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut loader = ConfigLoader::new()?;
        if let Some(env) = cli.env {
            loader = loader.with_environment(env.into());
        }
        if let Some(path) = &cli.config {
            loader = loader.with_config_file(path);
        }

        Ok(Self::new(loader.load_unvalidated()?))
    }

    /// Returns the merged configuration after validating it.
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }

        if let Some(Commands::Serve {
            host,
            port,
            log_level,
            ..
        }) = &cli.command
        {
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
            if let Some(level) = log_level {
                config.logger.level = level.as_str().to_string();
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseBackend;
    use clap::Parser;

    fn base_config() -> Settings {
        let mut config = Settings::default();
        config.database.backend = DatabaseBackend::Memory;
        config.jwt.secret = "k".repeat(32);
        config
    }

    fn merge(args: &[&str]) -> Result<Settings, ConfigError> {
        let cli = Cli::try_parse_from(args).unwrap();
        ConfigurationMerger::new(base_config()).merge_cli_args(&cli)
    }

    #[test]
    fn test_global_log_flags() {
        assert_eq!(merge(&["storefront-rs", "--verbose"]).unwrap().logger.level, "debug");
        assert_eq!(merge(&["storefront-rs", "--quiet"]).unwrap().logger.level, "error");
    }

    #[test]
    fn test_serve_overrides() {
        let merged = merge(&[
            "storefront-rs",
            "serve",
            "--host",
            "0.0.0.0",
            "--port",
            "8081",
        ])
        .unwrap();

        assert_eq!(merged.server.host, "0.0.0.0");
        assert_eq!(merged.server.port, 8081);
    }

    #[test]
    fn test_command_log_level_beats_global_flag() {
        let merged = merge(&["storefront-rs", "--verbose", "serve", "--log-level", "warn"]).unwrap();
        assert_eq!(merged.logger.level, "warn");
    }

    #[test]
    fn test_merged_config_is_validated() {
        let cli = Cli::try_parse_from(["storefront-rs"]).unwrap();
        let mut config = base_config();
        config.jwt.secret = "short".to_string();

        let result = ConfigurationMerger::new(config).merge_cli_args(&cli);
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }
}
