//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section, and every field has a serde default so partial files work.

pub mod comments;
pub mod database;
pub mod events;
pub mod logging;
pub mod store;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use self::comments::CommentsConfig;
pub use self::database::DatabaseConfig;
pub use self::events::EventsConfig;
pub use self::logging::LoggingConfig;
pub use self::store::{StoreBackend, StoreConfig};

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (base file + environment overlay + env vars).
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Comment store backend selection.
    #[serde(default)]
    pub store: StoreConfig,
    /// Comment content and thread limits.
    #[serde(default)]
    #[validate(nested)]
    pub comments: CommentsConfig,
    /// Domain event bus settings.
    #[serde(default)]
    #[validate(nested)]
    pub events: EventsConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the base file at `path` with `config/{THREADHUB_ENV}.toml`
    /// and environment variables prefixed with `THREADHUB_` (sections are
    /// separated by `__`, e.g. `THREADHUB_DATABASE__URL`).
    pub fn load(path: &str) -> Result<Self, AppError> {
        let env = std::env::var("THREADHUB_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("THREADHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config
            .validate()
            .map_err(|e| AppError::configuration(format!("Invalid configuration: {e}")))?;

        Ok(config)
    }

    /// Configuration for an in-memory deployment with default limits.
    pub fn in_memory() -> Self {
        Self {
            store: StoreConfig {
                backend: StoreBackend::Memory,
            },
            ..Self::default()
        }
    }
}
