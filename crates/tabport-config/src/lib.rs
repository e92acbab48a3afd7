//! # tabport-config
//!
//! Layered configuration loading for tabport using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`TABPORT_*` prefix, `__` as separator)
//! 2. Project-level `.tabport/config.toml`
//! 3. User-level `~/.config/tabport/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `TABPORT_DATABASE__PATH` -> `database.path`,
//! `TABPORT_IMPORT__CSV_SEPARATOR` -> `import.csv_separator`, etc.
//! The `__` (double underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use tabport_config::TabportConfig;
//!
//! let config = TabportConfig::load_with_dotenv().expect("config");
//! println!("database: {}", config.database.path);
//! ```

mod codec;
mod database;
mod error;
mod export;
mod import;

pub use codec::CodecConfig;
pub use database::{DEFAULT_DATA_SOURCE, DatabaseConfig};
pub use error::ConfigError;
pub use export::ExportConfig;
pub use import::ImportConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TabportConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub codec: CodecConfig,
}

impl TabportConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] for `.env` loading.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] if a source is malformed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load configuration after reading `.env` from the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] if a source is malformed.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests and the CLI can layer extra providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".tabport/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("TABPORT_").split("__"))
    }

    /// Check values that deserialize fine but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.import.csv_separator_byte()?;
        self.import.csv_quote_byte()?;
        if self.export.column_separator.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "export.column_separator".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.codec.date_format.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "codec.date_format".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tabport").join("config.toml"))
    }
}
