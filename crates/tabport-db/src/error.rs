//! Database layer error types.

use tabport_core::codec::CodecError;
use tabport_core::errors::CoreError;

use crate::writer::WriterState;

/// Errors raised by catalog resolution, the bulk writer, and the table reader.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// `DuckDB` operation failed.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// Input rejected before any query was issued.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A requested column does not exist in the table (or was requested twice).
    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    /// The writer could not open its transaction.
    #[error("Transaction unavailable: {0}")]
    TransactionUnavailable(#[source] duckdb::Error),

    /// The writer's transaction was already committed or rolled back.
    #[error("Transaction is {state}; no further operations are allowed")]
    TransactionClosed { state: WriterState },

    /// A statement failed and the database invalidated the transaction.
    #[error("Transaction aborted by a failed statement; only rollback is allowed")]
    TransactionAborted,

    /// A row has a different number of elements than the resolved schema.
    #[error("Row has {found} elements but {expected} columns were requested")]
    ElementCount { expected: usize, found: usize },

    /// A row element does not name the column at its position.
    #[error("Element {position} is '{found}' but column '{expected}' was expected")]
    ElementName {
        position: usize,
        expected: String,
        found: String,
    },

    /// A NULL value for the key column or a `NOT NULL` column.
    #[error("Column '{column}' does not accept NULL")]
    NullValue { column: String },

    /// A value could not be converted.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// An automatic export configuration does not exist.
    #[error("Export configuration {id} not found")]
    ConfigNotFound { id: i32 },
}

impl From<CoreError> for DatabaseError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Validation(message) => Self::Validation(message),
            other => Self::Validation(other.to_string()),
        }
    }
}
