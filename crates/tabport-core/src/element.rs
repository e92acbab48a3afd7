//! The string interchange form of a row.

use serde::{Deserialize, Serialize};

/// One cell of a row: a column name and its textual value.
///
/// `value` is `None` for SQL NULL on export and for an absent cell on import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowElement {
    pub column_name: String,
    pub value: Option<String>,
}

impl RowElement {
    pub fn new(column_name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            column_name: column_name.into(),
            value,
        }
    }

    /// Convenience constructor for a non-null cell.
    pub fn text(column_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(column_name, Some(value.into()))
    }

    /// Case-insensitive column name comparison.
    #[must_use]
    pub fn names(&self, column: &str) -> bool {
        self.column_name.eq_ignore_ascii_case(column)
    }
}

/// An ordered row: one element per requested column, primary key first.
pub type Row = Vec<RowElement>;
