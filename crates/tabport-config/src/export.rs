//! Export configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_column_separator() -> String {
    ";".to_string()
}

fn default_output_folder() -> String {
    "exports".to_string()
}

fn default_jobs_folder() -> String {
    "exports/jobs".to_string()
}

/// Two hours.
const fn default_file_lifetime_secs() -> u64 {
    7200
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    /// Separator used in the `columns` attribute of the tagged document.
    #[serde(default = "default_column_separator")]
    pub column_separator: String,

    /// Target folder of automatic exports.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Root of background export files, one sub-folder per job key.
    #[serde(default = "default_jobs_folder")]
    pub jobs_folder: String,

    /// Age after which background export files are removed by the cleaner.
    #[serde(default = "default_file_lifetime_secs")]
    pub file_lifetime_secs: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            column_separator: default_column_separator(),
            output_folder: default_output_folder(),
            jobs_folder: default_jobs_folder(),
            file_lifetime_secs: default_file_lifetime_secs(),
        }
    }
}

impl ExportConfig {
    #[must_use]
    pub const fn file_lifetime(&self) -> Duration {
        Duration::from_secs(self.file_lifetime_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = ExportConfig::default();
        assert_eq!(config.column_separator, ";");
        assert_eq!(config.output_folder, "exports");
        assert_eq!(config.jobs_folder, "exports/jobs");
        assert_eq!(config.file_lifetime(), Duration::from_secs(7200));
    }
}
