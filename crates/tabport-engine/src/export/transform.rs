//! Output transforms applied to an [`ExportDocument`].

use std::collections::HashMap;

use super::document::ExportDocument;
use crate::error::EngineError;

/// Id of the transform that returns the tagged document unchanged.
pub const RAW_TRANSFORM_ID: &str = "none";

/// Turns an export document into the final output text.
pub trait Transform: Send + Sync {
    /// Registry key, e.g. `csv`.
    fn id(&self) -> &str;

    /// File extension of the output, without the dot.
    fn extension(&self) -> &str;

    /// Render `document`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Transform`] or [`EngineError::Document`] if
    /// rendering fails.
    fn apply(&self, document: &ExportDocument) -> Result<String, EngineError>;
}

/// The tagged XML document itself.
#[derive(Debug, Clone)]
pub struct RawTransform {
    id: &'static str,
}

impl Transform for RawTransform {
    fn id(&self) -> &str {
        self.id
    }

    fn extension(&self) -> &str {
        "xml"
    }

    fn apply(&self, document: &ExportDocument) -> Result<String, EngineError> {
        document.to_xml()
    }
}

/// Comma-separated values with a header line. NULL is an empty field.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvTransform;

impl Transform for CsvTransform {
    fn id(&self) -> &str {
        "csv"
    }

    fn extension(&self) -> &str {
        "csv"
    }

    fn apply(&self, document: &ExportDocument) -> Result<String, EngineError> {
        let failed = |reason: String| EngineError::Transform {
            id: "csv".to_string(),
            reason,
        };
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&document.columns)
            .map_err(|e| failed(e.to_string()))?;
        for row in &document.rows {
            writer
                .write_record(row.iter().map(|e| e.value.as_deref().unwrap_or_default()))
                .map_err(|e| failed(e.to_string()))?;
        }
        let bytes = writer.into_inner().map_err(|e| failed(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| failed(e.to_string()))
    }
}

/// A JSON array with one object per row. NULL is `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTransform;

impl Transform for JsonTransform {
    fn id(&self) -> &str {
        "json"
    }

    fn extension(&self) -> &str {
        "json"
    }

    fn apply(&self, document: &ExportDocument) -> Result<String, EngineError> {
        let rows = document
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|e| (e.column_name.clone(), serde_json::json!(e.value)))
                    .collect::<serde_json::Map<_, _>>()
            })
            .collect::<Vec<_>>();
        serde_json::to_string_pretty(&rows).map_err(|e| EngineError::Transform {
            id: "json".to_string(),
            reason: e.to_string(),
        })
    }
}

/// Transforms by id.
pub struct TransformRegistry {
    transforms: HashMap<String, Box<dyn Transform>>,
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TransformRegistry {
    /// An empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            transforms: HashMap::new(),
        }
    }

    /// `none` and `xml` (raw document), `csv`, `json`.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(RawTransform {
            id: RAW_TRANSFORM_ID,
        });
        registry.register(RawTransform { id: "xml" });
        registry.register(CsvTransform);
        registry.register(JsonTransform);
        registry
    }

    /// Add or replace the transform under its id.
    pub fn register(&mut self, transform: impl Transform + 'static) {
        self.transforms
            .insert(transform.id().to_lowercase(), Box::new(transform));
    }

    /// Look a transform up by id (case-insensitive).
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&dyn Transform> {
        self.transforms
            .get(&id.trim().to_lowercase())
            .map(|transform| &**transform)
    }

    /// Registered ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        let mut ids = self.transforms.keys().map(String::as_str).collect::<Vec<_>>();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tabport_core::element::RowElement;

    fn document() -> ExportDocument {
        ExportDocument {
            column_separator: ";".to_string(),
            columns: vec!["id".to_string(), "name".to_string()],
            rows: vec![
                vec![RowElement::text("id", "1"), RowElement::text("name", "a,b")],
                vec![RowElement::text("id", "2"), RowElement::new("name", None)],
            ],
        }
    }

    #[test]
    fn default_ids() {
        assert_eq!(
            TransformRegistry::with_defaults().ids(),
            vec!["csv", "json", "none", "xml"]
        );
    }

    #[test]
    fn lookup_ignores_case() {
        let registry = TransformRegistry::with_defaults();
        assert_eq!(registry.get("JSON").map(|t| t.extension()), Some("json"));
        assert_eq!(registry.get("none").map(|t| t.extension()), Some("xml"));
        assert!(registry.get("xsl").is_none());
    }

    #[test]
    fn csv_quotes_and_blanks() {
        let out = CsvTransform.apply(&document()).unwrap();
        assert_eq!(out, "id,name\n1,\"a,b\"\n2,\n");
    }

    #[test]
    fn json_keeps_nulls() {
        let out = JsonTransform.apply(&document()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!([
                {"id": "1", "name": "a,b"},
                {"id": "2", "name": null}
            ])
        );
    }

    #[test]
    fn raw_is_the_tagged_document() {
        let doc = document();
        assert_eq!(RawTransform { id: "none" }.apply(&doc).unwrap(), doc.to_xml().unwrap());
    }
}
