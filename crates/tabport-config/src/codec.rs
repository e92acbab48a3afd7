//! Value codec configuration.

use serde::{Deserialize, Serialize};

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CodecConfig {
    /// strftime pattern for DATE columns, used on both import and export.
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
        }
    }
}
