//! Database connection configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ConfigError;

/// Name of the data source that always resolves to [`DatabaseConfig::path`].
pub const DEFAULT_DATA_SOURCE: &str = "default";

fn default_path() -> String {
    "tabport.duckdb".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// DuckDB database file used by interactive commands.
    #[serde(default = "default_path")]
    pub path: String,

    /// Additional named databases, referenced by stored export configurations.
    #[serde(default)]
    pub data_sources: BTreeMap<String, String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            data_sources: BTreeMap::new(),
        }
    }
}

impl DatabaseConfig {
    /// Resolve a data source name to a database path.
    ///
    /// An empty name and [`DEFAULT_DATA_SOURCE`] resolve to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownDataSource`] for an unregistered name.
    pub fn path_for(&self, data_source: &str) -> Result<&str, ConfigError> {
        if data_source.is_empty() || data_source == DEFAULT_DATA_SOURCE {
            return Ok(&self.path);
        }
        self.data_sources
            .get(data_source)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::UnknownDataSource {
                name: data_source.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_source_resolves_to_main_path() {
        let config = DatabaseConfig::default();
        assert_eq!(config.path_for("default").unwrap(), "tabport.duckdb");
        assert_eq!(config.path_for("").unwrap(), "tabport.duckdb");
    }

    #[test]
    fn named_sources_resolve_or_fail() {
        let mut config = DatabaseConfig::default();
        config
            .data_sources
            .insert("archive".to_string(), "/data/archive.duckdb".to_string());
        assert_eq!(config.path_for("archive").unwrap(), "/data/archive.duckdb");
        assert!(matches!(
            config.path_for("missing"),
            Err(ConfigError::UnknownDataSource { .. })
        ));
    }
}
