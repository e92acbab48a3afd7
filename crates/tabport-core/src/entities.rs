//! Persisted entities.

use serde::{Deserialize, Serialize};

/// A stored export definition, run by the automatic export sweep.
///
/// `columns` keeps the request order; its first entry is the primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomaticExportConfig {
    pub id: i32,
    pub table_name: String,
    pub output_file_name: String,
    pub columns: Vec<String>,
    pub transform_id: String,
    pub data_source: String,
}
