//! Conversion between the string interchange form and typed cell values.
//!
//! Decoding runs on import (source text → [`CellValue`] bound to a statement);
//! encoding runs on export ([`CellValue`] read from a result set → text).
//!
//! | Type | decode | encode |
//! |------|--------|--------|
//! | Int / Long / Double | numeric literal | decimal string |
//! | String | pass-through | text |
//! | Timestamp | all digits = epoch millis, else `YYYY-MM-DD HH:MM:SS[.fff]` | epoch millis |
//! | Date | configured date format | configured date format |
//! | Byte | hex, optional `0x` prefix | lowercase hex |
//!
//! Blank text and `null` (any case) decode to [`CellValue::Null`] for every
//! type except String.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt::Write as _;
use thiserror::Error;

use crate::column::{ColumnDescriptor, ColumnType};

/// Default date pattern, ISO-8601 calendar date.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Accepted textual timestamp layouts when the value is not epoch millis.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Errors raised while converting a single cell.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The text could not be parsed as the column's type.
    #[error("Invalid {column_type} value '{value}' for column '{column}': {reason}")]
    ValueFormat {
        column: String,
        column_type: ColumnType,
        value: String,
        reason: String,
    },

    /// A database value does not fit the column's semantic type.
    #[error("Column '{column}' is {column_type} but the database returned a {found} value")]
    Mismatch {
        column: String,
        column_type: ColumnType,
        found: &'static str,
    },

    /// The column's catalog type is not supported.
    #[error("Column '{column}' has unsupported type '{data_type}'")]
    UnknownType { column: String, data_type: String },

    /// The configured date pattern is not a valid strftime pattern.
    #[error("Invalid date format '{0}'")]
    InvalidDateFormat(String),
}

/// A typed cell, independent of any database driver.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Text(String),
    Int(i32),
    Long(i64),
    Double(f64),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Bytes(Vec<u8>),
}

impl CellValue {
    /// Short name of the variant, used in mismatch errors.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::Date(_) => "date",
            Self::Timestamp(_) => "timestamp",
            Self::Bytes(_) => "bytes",
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Whether `raw` stands for SQL NULL: blank, or `null` in any case.
#[must_use]
pub fn is_null_sentinel(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null")
}

/// Stateless converter parameterised by the date pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowCodec {
    date_format: String,
}

impl Default for RowCodec {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl RowCodec {
    /// Build a codec using `date_format` (strftime syntax) for DATE columns.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidDateFormat`] if the pattern does not parse.
    pub fn new(date_format: impl Into<String>) -> Result<Self, CodecError> {
        let date_format = date_format.into();
        if date_format.trim().is_empty()
            || StrftimeItems::new(&date_format).any(|item| matches!(item, Item::Error))
        {
            return Err(CodecError::InvalidDateFormat(date_format));
        }
        Ok(Self { date_format })
    }

    #[must_use]
    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// Convert interchange text into a typed value for `column`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnknownType`] for an unclassified column and
    /// [`CodecError::ValueFormat`] for text that does not parse.
    pub fn decode(
        &self,
        column: &ColumnDescriptor,
        raw: Option<&str>,
    ) -> Result<CellValue, CodecError> {
        let column_type = column.semantic_type()?;
        self.decode_as(column_type, raw)
            .map_err(|reason| CodecError::ValueFormat {
                column: column.name.clone(),
                column_type,
                value: raw.unwrap_or_default().to_string(),
                reason,
            })
    }

    /// Render a typed value read from the database as interchange text.
    ///
    /// NULL renders as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnknownType`] for an unclassified column and
    /// [`CodecError::Mismatch`] when the value cannot represent the column type.
    pub fn encode(
        &self,
        column: &ColumnDescriptor,
        value: &CellValue,
    ) -> Result<Option<String>, CodecError> {
        let column_type = column.semantic_type()?;
        let mismatch = || CodecError::Mismatch {
            column: column.name.clone(),
            column_type,
            found: value.kind(),
        };

        let text = match (column_type, value) {
            (_, CellValue::Null) => return Ok(None),
            (ColumnType::String, CellValue::Text(text)) => text.clone(),
            (_, CellValue::Int(v)) if renders_integers(column_type) => v.to_string(),
            (_, CellValue::Long(v)) if renders_integers(column_type) => v.to_string(),
            (ColumnType::String | ColumnType::Double, CellValue::Double(v)) => v.to_string(),
            (ColumnType::Date, CellValue::Date(date)) => self.format_date(*date)?,
            (ColumnType::Date, CellValue::Timestamp(ts)) => self.format_date(ts.date())?,
            (ColumnType::Timestamp, CellValue::Timestamp(ts)) => {
                ts.and_utc().timestamp_millis().to_string()
            }
            (ColumnType::Byte, CellValue::Bytes(bytes)) => hex::encode(bytes),
            _ => return Err(mismatch()),
        };
        Ok(Some(text))
    }

    fn format_date(&self, date: NaiveDate) -> Result<String, CodecError> {
        let mut out = String::new();
        write!(out, "{}", date.format(&self.date_format))
            .map_err(|_| CodecError::InvalidDateFormat(self.date_format.clone()))?;
        Ok(out)
    }

    fn decode_as(&self, column_type: ColumnType, raw: Option<&str>) -> Result<CellValue, String> {
        if column_type == ColumnType::String {
            return Ok(raw.map_or(CellValue::Null, |text| CellValue::Text(text.to_string())));
        }
        let Some(raw) = raw.filter(|text| !is_null_sentinel(text)) else {
            return Ok(CellValue::Null);
        };
        let raw = raw.trim();

        match column_type {
            ColumnType::String => Ok(CellValue::Text(raw.to_string())),
            ColumnType::Int => raw
                .parse::<i32>()
                .map(CellValue::Int)
                .map_err(|e| e.to_string()),
            ColumnType::Long => raw
                .parse::<i64>()
                .map(CellValue::Long)
                .map_err(|e| e.to_string()),
            ColumnType::Double => raw
                .parse::<f64>()
                .map(CellValue::Double)
                .map_err(|e| e.to_string()),
            ColumnType::Date => NaiveDate::parse_from_str(raw, &self.date_format)
                .map(CellValue::Date)
                .map_err(|e| format!("{e} (expected {})", self.date_format)),
            ColumnType::Timestamp => parse_timestamp(raw).map(CellValue::Timestamp),
            ColumnType::Byte => {
                let digits = raw
                    .strip_prefix("0x")
                    .or_else(|| raw.strip_prefix("0X"))
                    .unwrap_or(raw);
                hex::decode(digits)
                    .map(CellValue::Bytes)
                    .map_err(|e| e.to_string())
            }
        }
    }
}

const fn renders_integers(column_type: ColumnType) -> bool {
    matches!(
        column_type,
        ColumnType::String | ColumnType::Int | ColumnType::Long | ColumnType::Double
    )
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, String> {
    if raw.chars().all(|c| c.is_ascii_digit()) {
        let millis = raw.parse::<i64>().map_err(|e| e.to_string())?;
        return DateTime::from_timestamp_millis(millis)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| format!("epoch millis {millis} out of range"));
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .ok_or_else(|| "expected epoch millis or YYYY-MM-DD HH:MM:SS[.fff]".to_string())
}
