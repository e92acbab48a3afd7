//! Import configuration: CSV dialect and the folder sweep.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_csv_separator() -> String {
    ",".to_string()
}

fn default_csv_quote() -> String {
    "\"".to_string()
}

fn default_source_folder() -> String {
    "imports".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImportConfig {
    /// Field separator for CSV sources. Must be a single ASCII character.
    #[serde(default = "default_csv_separator")]
    pub csv_separator: String,

    /// Quote character for CSV sources. Must be a single ASCII character.
    #[serde(default = "default_csv_quote")]
    pub csv_quote: String,

    /// Folder scanned by the import sweep.
    #[serde(default = "default_source_folder")]
    pub source_folder: String,

    /// Tables the sweep may import into; a file's stem must match one of them.
    #[serde(default)]
    pub importable_tables: Vec<String>,

    /// Sweep option: update rows whose primary key already exists.
    #[serde(default)]
    pub update_existing_rows: bool,

    /// Sweep option: roll back on the first failing row.
    #[serde(default)]
    pub stop_on_errors: bool,

    /// Sweep option: delete all rows before importing.
    #[serde(default)]
    pub empty_table_before_import: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            csv_separator: default_csv_separator(),
            csv_quote: default_csv_quote(),
            source_folder: default_source_folder(),
            importable_tables: Vec::new(),
            update_existing_rows: false,
            stop_on_errors: false,
            empty_table_before_import: false,
        }
    }
}

impl ImportConfig {
    /// The CSV separator as a byte.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] unless the setting is one ASCII character.
    pub fn csv_separator_byte(&self) -> Result<u8, ConfigError> {
        single_ascii_byte("import.csv_separator", &self.csv_separator)
    }

    /// The CSV quote character as a byte.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] unless the setting is one ASCII character.
    pub fn csv_quote_byte(&self) -> Result<u8, ConfigError> {
        single_ascii_byte("import.csv_quote", &self.csv_quote)
    }

    /// Whether the sweep may import into `table` (case-insensitive).
    #[must_use]
    pub fn is_importable(&self, table: &str) -> bool {
        self.importable_table(table).is_some()
    }

    /// The configured spelling of `name`, matched case-insensitively.
    #[must_use]
    pub fn importable_table(&self, name: &str) -> Option<&str> {
        self.importable_tables
            .iter()
            .map(|allowed| allowed.trim())
            .find(|allowed| allowed.eq_ignore_ascii_case(name))
    }
}

fn single_ascii_byte(field: &str, value: &str) -> Result<u8, ConfigError> {
    match value.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("expected a single ASCII character, got '{value}'"),
        }),
    }
}
