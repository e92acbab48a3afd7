//! Semantic column types and the descriptors resolved from the database catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codec::CodecError;

// ---------------------------------------------------------------------------
// ColumnType
// ---------------------------------------------------------------------------

/// Semantic type of a column, derived from the catalog type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    String,
    Int,
    Long,
    Double,
    Date,
    Timestamp,
    Byte,
}

/// Ordered classification rules. The first rule with a matching fragment wins,
/// so `bigint` has to be checked before `int`.
const CLASSIFICATION_RULES: &[(&[&str], ColumnType)] = &[
    (&["bigint"], ColumnType::Long),
    (&["int"], ColumnType::Int),
    (&["varchar", "text", "character"], ColumnType::String),
    (&["timestamp"], ColumnType::Timestamp),
    (&["date"], ColumnType::Date),
    (&["double", "real"], ColumnType::Double),
    (&["byte", "blob"], ColumnType::Byte),
];

impl ColumnType {
    /// Classify a catalog type name such as `BIGINT` or `character varying(32)`.
    ///
    /// Matching is a case-insensitive substring test. Returns `None` for a
    /// missing or blank type name, or a type no rule recognises.
    #[must_use]
    pub fn classify(raw: Option<&str>) -> Option<Self> {
        let raw = raw?.trim();
        if raw.is_empty() {
            return None;
        }
        let lowered = raw.to_lowercase();
        CLASSIFICATION_RULES
            .iter()
            .find(|(fragments, _)| fragments.iter().any(|f| lowered.contains(f)))
            .map(|(_, column_type)| *column_type)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Long => "long",
            Self::Double => "double",
            Self::Date => "date",
            Self::Timestamp => "timestamp",
            Self::Byte => "byte",
        }
    }

    /// Whether blank and `null` sentinels decode to NULL for this type.
    #[must_use]
    pub const fn honours_null_sentinel(self) -> bool {
        !matches!(self, Self::String)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ColumnDescriptor
// ---------------------------------------------------------------------------

/// One resolved column of a table, in the order the caller requested it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Lowercased column name.
    pub name: String,
    /// True for the first column of the request.
    pub is_primary_key: bool,
    /// Classified type; `None` when the catalog type is not recognised.
    pub column_type: Option<ColumnType>,
    /// Type name exactly as the catalog reported it.
    pub data_type: String,
    /// False when the catalog declares the column `NOT NULL`.
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

const fn default_nullable() -> bool {
    true
}

impl ColumnDescriptor {
    /// Build a descriptor from a catalog row, classifying its type.
    #[must_use]
    pub fn from_catalog(name: &str, data_type: &str, is_primary_key: bool) -> Self {
        Self {
            name: name.to_lowercase(),
            is_primary_key,
            column_type: ColumnType::classify(Some(data_type)),
            data_type: data_type.to_string(),
            nullable: true,
        }
    }

    /// Same descriptor with the catalog's nullability.
    #[must_use]
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Whether the column can hold SQL NULL. The key column never can.
    #[must_use]
    pub const fn accepts_null(&self) -> bool {
        self.nullable && !self.is_primary_key
    }

    /// The semantic type, or an error naming the column when it is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnknownType`] if the catalog type was not classified.
    pub fn semantic_type(&self) -> Result<ColumnType, CodecError> {
        self.column_type.ok_or_else(|| CodecError::UnknownType {
            column: self.name.clone(),
            data_type: self.data_type.clone(),
        })
    }
}
