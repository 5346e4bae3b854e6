//! Command-line entry point
//!
//! - Argument parsing with clap
//! - Merging command-line overrides into the file configuration
//! - Dispatching `serve` and `migrate`

pub mod config_merger;
pub mod executor;
pub mod handlers;
pub mod parser;
pub mod validation;

pub use config_merger::ConfigurationMerger;
pub use executor::execute_command;
pub use parser::{Cli, Commands, Environment, LogLevel};

use crate::config::Settings;
use crate::logger::{LogLevelHandle, init_logger};

/// Loads the configuration for `cli` and applies its overrides.
///
/// # Errors
/// Returns an error if loading, merging, or validation fails.
pub fn load_and_merge_config(cli: &Cli) -> anyhow::Result<Settings> {
    let merger = ConfigurationMerger::from_cli(cli)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    merger
        .merge_cli_args(cli)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))
}

pub fn init_logger_from_settings(settings: &Settings) -> anyhow::Result<LogLevelHandle> {
    let logger_config = settings
        .logger
        .clone()
        .into_logger_config()
        .map_err(|e| anyhow::anyhow!("Logger configuration error: {}", e))?;

    init_logger(logger_config).map_err(|e| anyhow::anyhow!("Logger initialization error: {}", e))
}

/// Loads configuration, installs the logger and runs the requested command.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = load_and_merge_config(&cli)?;
    let _log_handle = init_logger_from_settings(&settings)?;

    tracing::debug!(command = ?cli.command_or_default(), "Executing command");
    execute_command(&cli, settings).await
}
