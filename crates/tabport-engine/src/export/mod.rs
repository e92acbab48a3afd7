//! Export orchestration: read a table, build the tagged document, apply a
//! transform.

pub mod document;
pub mod transform;

pub use document::ExportDocument;
pub use transform::{RAW_TRANSFORM_ID, Transform, TransformRegistry};

use duckdb::Connection;
use std::fs;
use std::path::Path;
use tabport_config::{ExportConfig, TabportConfig};
use tabport_core::codec::RowCodec;
use tabport_db::reader::read_rows;

use crate::error::EngineError;

/// Builds export output for a table and column request.
pub struct Exporter {
    codec: RowCodec,
    column_separator: String,
    transforms: TransformRegistry,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(RowCodec::default(), ExportConfig::default().column_separator)
    }
}

impl Exporter {
    /// Exporter with the built-in transforms.
    #[must_use]
    pub fn new(codec: RowCodec, column_separator: impl Into<String>) -> Self {
        Self {
            codec,
            column_separator: column_separator.into(),
            transforms: TransformRegistry::with_defaults(),
        }
    }

    /// Exporter configured from the `[export]` and `[codec]` sections.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Codec`] if the configured date format is invalid.
    pub fn from_config(config: &TabportConfig) -> Result<Self, EngineError> {
        let codec = RowCodec::new(config.codec.date_format.clone())?;
        Ok(Self::new(codec, config.export.column_separator.clone()))
    }

    /// Replace the transform registry.
    #[must_use]
    pub fn with_transforms(mut self, transforms: TransformRegistry) -> Self {
        self.transforms = transforms;
        self
    }

    #[must_use]
    pub const fn transforms(&self) -> &TransformRegistry {
        &self.transforms
    }

    /// Read `columns` of `table` into a tagged document.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Database`] if the schema does not resolve or a
    /// value cannot be rendered.
    pub fn document(
        &self,
        conn: &Connection,
        table: &str,
        columns: &[String],
    ) -> Result<ExportDocument, EngineError> {
        let rows = read_rows(conn, table, columns, &self.codec)?;
        Ok(ExportDocument {
            column_separator: self.column_separator.clone(),
            columns: columns.to_vec(),
            rows,
        })
    }

    /// Export `columns` of `table` through the transform `transform_id`.
    ///
    /// `none` and `xml` return the tagged document itself.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnsupportedFormat`] for an unknown transform
    /// (before the table is read), or the read/transform error.
    pub fn export(
        &self,
        conn: &Connection,
        table: &str,
        columns: &[String],
        transform_id: &str,
    ) -> Result<String, EngineError> {
        let transform = self
            .transforms
            .get(transform_id)
            .ok_or_else(|| EngineError::UnsupportedFormat(transform_id.to_string()))?;
        let document = self.document(conn, table, columns)?;
        let output = transform.apply(&document)?;
        tracing::debug!(
            table,
            transform = transform.id(),
            rows = document.rows.len(),
            "export rendered"
        );
        Ok(output)
    }

    /// Export into `path`, replacing any existing file.
    ///
    /// Returns `false` instead of an error when the old file cannot be removed,
    /// the parent directory cannot be created, the export fails, or the file
    /// cannot be written.
    pub fn export_to_file(
        &self,
        path: &Path,
        conn: &Connection,
        table: &str,
        columns: &[String],
        transform_id: &str,
    ) -> bool {
        match self.try_export_to_file(path, conn, table, columns, transform_id) {
            Ok(()) => {
                tracing::info!(table, path = %path.display(), "export written");
                true
            }
            Err(error) => {
                tracing::error!(table, path = %path.display(), %error, "export to file failed");
                false
            }
        }
    }

    fn try_export_to_file(
        &self,
        path: &Path,
        conn: &Connection,
        table: &str,
        columns: &[String],
        transform_id: &str,
    ) -> Result<(), EngineError> {
        if path.exists() {
            fs::remove_file(path)?;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let output = self.export(conn, table, columns, transform_id)?;
        fs::write(path, output)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, name VARCHAR);
             INSERT INTO t VALUES (1, 'a');",
        )
        .unwrap();
        conn
    }

    fn columns() -> Vec<String> {
        vec!["id".to_string(), "name".to_string()]
    }

    #[test]
    fn unknown_transform_fails_before_reading() {
        let err = Exporter::default()
            .export(&conn(), "missing_table", &columns(), "xsl")
            .unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedFormat(ref id) if id == "xsl"));
    }

    #[test]
    fn export_to_file_replaces_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("t.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "stale").unwrap();

        assert!(Exporter::default().export_to_file(&path, &conn(), "t", &columns(), "json"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"name\": \"a\""));
    }

    #[test]
    fn export_to_file_reports_failure_as_false() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xml");
        assert!(!Exporter::default().export_to_file(&path, &conn(), "t", &columns(), "xsl"));
        assert!(!Exporter::default().export_to_file(
            &path,
            &conn(),
            "t",
            &["ghost".to_string()],
            "none"
        ));
        assert!(!path.exists());
    }
}
