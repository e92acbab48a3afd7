//! Pluggable import sources.
//!
//! A source yields the column names of its first line, then one [`Row`] per
//! record. Factories are picked by file extension through a
//! [`SourceRegistry`].

pub mod delimited;

use std::path::Path;
use tabport_config::ImportConfig;
use tabport_core::element::Row;

use crate::error::{EngineError, SourceError};

pub use delimited::{CsvImportSource, CsvSourceFactory};

/// A stream of rows to import.
pub trait ImportSource {
    /// Column names declared by the source, in source order.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the header cannot be read.
    fn column_names(&mut self) -> Result<Vec<String>, SourceError>;

    /// The next row, or `None` once the source is exhausted.
    ///
    /// A row whose shape does not match the header is returned empty rather
    /// than as an error, so the importer can record it against its item
    /// number.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the underlying reader fails.
    fn next_row(&mut self) -> Result<Option<Row>, SourceError>;

    /// Release the underlying reader. Further reads yield `None`.
    fn close(&mut self);
}

/// Builds import sources for files with a given extension.
pub trait ImportSourceFactory: Send + Sync {
    /// Whether this factory reads files with `extension` (without the dot).
    fn accepts(&self, extension: &str) -> bool;

    /// Open `path` as an import source.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Io`] if the file cannot be opened.
    fn open(&self, path: &Path) -> Result<Box<dyn ImportSource + Send>, SourceError>;
}

/// Extension-dispatched set of [`ImportSourceFactory`] implementations.
#[derive(Default)]
pub struct SourceRegistry {
    factories: Vec<Box<dyn ImportSourceFactory>>,
}

impl SourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the CSV factory configured from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if the CSV separator or quote is invalid.
    pub fn with_defaults(config: &ImportConfig) -> Result<Self, EngineError> {
        let mut registry = Self::new();
        registry.register(CsvSourceFactory::from_config(config)?);
        Ok(registry)
    }

    /// Add a factory. Earlier registrations win on overlapping extensions.
    pub fn register(&mut self, factory: impl ImportSourceFactory + 'static) {
        self.factories.push(Box::new(factory));
    }

    /// Whether some factory reads `path`.
    #[must_use]
    pub fn supports(&self, path: &Path) -> bool {
        self.factory_for(path).is_some()
    }

    /// Open `path` with the first factory accepting its extension.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Unsupported`] if no factory accepts the file, or
    /// the factory's error if opening fails.
    pub fn open_path(&self, path: &Path) -> Result<Box<dyn ImportSource + Send>, SourceError> {
        self.factory_for(path)
            .ok_or_else(|| SourceError::Unsupported(path.display().to_string()))?
            .open(path)
    }

    fn factory_for(&self, path: &Path) -> Option<&dyn ImportSourceFactory> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        self.factories
            .iter()
            .find(|factory| factory.accepts(&extension))
            .map(|factory| &**factory)
    }
}
