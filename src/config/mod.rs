//! Configuration management
//!
//! Layered TOML files plus `STOREFRONT_*` environment overrides, deserialized
//! into [`Settings`] and validated section by section.
//!
//! # Configuration Priority (lowest to highest)
//! 1. `default.toml` - Base default configuration
//! 2. `{environment}.toml` - Environment-specific configuration
//! 3. `local.toml` - Local overrides (not committed to version control)
//! 4. `STOREFRONT_*` environment variables
//! 5. Command-line flags (applied by the CLI)

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use loader::ConfigLoader;
pub use settings::{
    CacheConfig, CorsConfig, DatabaseBackend, DatabaseConfig, JwtConfig, ServerConfig, Settings,
};
