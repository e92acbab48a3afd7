//! Engine error types.

use tabport_config::ConfigError;
use tabport_core::codec::CodecError;
use tabport_db::DatabaseError;

/// Errors raised while reading an import source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The underlying reader failed.
    #[error("Source I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A CSV record could not be decoded.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The source has no header line.
    #[error("Source has no column names")]
    MissingHeader,

    /// No registered factory handles this file.
    #[error("No import source accepts '{0}'")]
    Unsupported(String),
}

/// Errors raised by the import/export orchestrators and maintenance runs.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// File system operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No transform is registered under the requested id.
    #[error("Unsupported export format '{0}'")]
    UnsupportedFormat(String),

    /// A job key or table name that would leave the jobs folder.
    #[error("'{0}' is not a single path segment")]
    InvalidPathSegment(String),

    /// A transform failed to render the document.
    #[error("Transform '{id}' failed: {reason}")]
    Transform { id: String, reason: String },

    /// The tagged document could not be written.
    #[error("Export document error: {0}")]
    Document(String),

    /// A job runner was built outside a tokio runtime.
    #[error("No tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

impl From<duckdb::Error> for EngineError {
    fn from(error: duckdb::Error) -> Self {
        Self::Database(DatabaseError::from(error))
    }
}
