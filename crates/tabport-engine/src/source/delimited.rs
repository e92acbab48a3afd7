//! Delimited text import source backed by the `csv` crate.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use tabport_config::ImportConfig;
use tabport_core::element::{Row, RowElement};

use super::{ImportSource, ImportSourceFactory};
use crate::error::{EngineError, SourceError};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Reads a header line of column names, then one row per record.
///
/// Header names are trimmed, lowercased, and stripped of accents. A record
/// whose field count differs from the header becomes an empty row.
pub struct CsvImportSource<R> {
    reader: Option<csv::Reader<R>>,
    columns: Option<Vec<String>>,
}

impl CsvImportSource<File> {
    /// Open a file with the given separator and quote bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Io`] if the file cannot be opened.
    pub fn open(path: &Path, separator: u8, quote: u8) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Ok(Self::from_reader(file, separator, quote))
    }
}

impl<R: Read> CsvImportSource<R> {
    pub fn from_reader(reader: R, separator: u8, quote: u8) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(separator)
            .quote(quote)
            .from_reader(reader);
        Self {
            reader: Some(reader),
            columns: None,
        }
    }

    fn read_record(&mut self) -> Result<Option<csv::StringRecord>, SourceError> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };
        let mut record = csv::StringRecord::new();
        if reader.read_record(&mut record)? {
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }
}

impl<R: Read> ImportSource for CsvImportSource<R> {
    fn column_names(&mut self) -> Result<Vec<String>, SourceError> {
        if let Some(columns) = &self.columns {
            return Ok(columns.clone());
        }
        let header = self.read_record()?.ok_or(SourceError::MissingHeader)?;
        let columns = header
            .iter()
            .enumerate()
            .map(|(index, title)| normalize_title(title, index == 0))
            .collect::<Vec<_>>();
        self.columns = Some(columns.clone());
        Ok(columns)
    }

    fn next_row(&mut self) -> Result<Option<Row>, SourceError> {
        let columns = self.column_names()?;
        let Some(record) = self.read_record()? else {
            return Ok(None);
        };
        if record.len() != columns.len() {
            tracing::debug!(
                expected = columns.len(),
                found = record.len(),
                "record field count differs from header"
            );
            return Ok(Some(Vec::new()));
        }
        let row = columns
            .iter()
            .zip(record.iter())
            .map(|(column, value)| RowElement::text(column.clone(), value))
            .collect();
        Ok(Some(row))
    }

    fn close(&mut self) {
        self.reader = None;
    }
}

/// Opens `.csv` files with a configured dialect.
#[derive(Debug, Clone, Copy)]
pub struct CsvSourceFactory {
    separator: u8,
    quote: u8,
}

impl Default for CsvSourceFactory {
    fn default() -> Self {
        Self {
            separator: b',',
            quote: b'"',
        }
    }
}

impl CsvSourceFactory {
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if the separator or quote is not a
    /// single ASCII character.
    pub fn from_config(config: &ImportConfig) -> Result<Self, EngineError> {
        Ok(Self {
            separator: config.csv_separator_byte()?,
            quote: config.csv_quote_byte()?,
        })
    }
}

impl ImportSourceFactory for CsvSourceFactory {
    fn accepts(&self, extension: &str) -> bool {
        extension.eq_ignore_ascii_case("csv")
    }

    fn open(&self, path: &Path) -> Result<Box<dyn ImportSource + Send>, SourceError> {
        Ok(Box::new(CsvImportSource::open(
            path,
            self.separator,
            self.quote,
        )?))
    }
}

/// Normalize a header title into a column name.
///
/// The first title may carry a byte order mark or a stray non-Latin-1
/// character left by the producing tool; either is dropped.
fn normalize_title(title: &str, first: bool) -> String {
    let mut title = title.trim().to_lowercase();
    if first {
        if let Some(stripped) = title.strip_prefix(BYTE_ORDER_MARK) {
            title = stripped.to_string();
        } else if title.chars().next().is_some_and(|c| u32::from(c) > 0xff) {
            title = title.chars().skip(1).collect();
        }
    }
    title.chars().map(fold_accent).collect()
}

/// Replace a lowercase Latin-1 accented letter by its base letter.
const fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}
