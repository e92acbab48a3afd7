//! Cross-cutting error types for tabport.
//!
//! Domain-specific errors (`CodecError`, `DatabaseError`, `EngineError`) are
//! defined next to the code that raises them. The CLI converges them through
//! `anyhow`.

use thiserror::Error;

/// Errors that can be raised by any tabport crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input failed validation before any I/O was attempted.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A state machine transition was attempted that is not allowed.
    #[error("Invalid state transition: {entity} from {from} to {to}")]
    InvalidTransition {
        entity: String,
        from: String,
        to: String,
    },
}

/// Reject an empty table name or an empty column request.
///
/// # Errors
///
/// Returns [`CoreError::Validation`] naming the offending argument.
pub fn validate_request(table: &str, columns: &[String]) -> Result<(), CoreError> {
    if table.trim().is_empty() {
        return Err(CoreError::Validation("table name is empty".to_string()));
    }
    if columns.is_empty() {
        return Err(CoreError::Validation(format!(
            "no columns requested for table '{table}'"
        )));
    }
    Ok(())
}
