//! # tabport-db
//!
//! `DuckDB` access for the tabport import/export engine.
//!
//! - [`catalog`]: column metadata discovery and schema resolution
//! - [`writer`]: transactional [`BulkWriter`] (insert / update / exists)
//! - [`reader`]: streaming table reads rendered as interchange text
//! - [`export_configs`]: stored automatic export configurations
//!
//! Table and column names of the generic statements are never taken from
//! input directly: every statement is built from a schema the catalog
//! resolved first.

pub mod catalog;
pub mod error;
pub mod export_configs;
pub mod reader;
pub mod schemas;
pub mod sql;
pub mod values;
pub mod writer;

pub use error::DatabaseError;
pub use writer::{BulkWriter, WriterState};

use duckdb::Connection;

/// Handle to a `DuckDB` database holding user tables and tabport's own
/// bookkeeping tables.
pub struct TableStore {
    conn: Connection,
}

impl TableStore {
    /// Open or create a database file.
    ///
    /// Creates the bookkeeping tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DuckDb`] if the file cannot be opened or schema creation fails.
    pub fn open(path: &str) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DuckDb`] if schema creation fails.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    /// Wrap an existing connection, creating the bookkeeping tables.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DuckDb`] if schema creation fails.
    pub fn from_connection(conn: Connection) -> Result<Self, DatabaseError> {
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Access the underlying `DuckDB` connection.
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Mutable access, needed to open a [`BulkWriter`] transaction.
    pub const fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// A second connection to the same database, for use on another thread.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DuckDb`] if the connection cannot be cloned.
    pub fn try_clone_connection(&self) -> Result<Connection, DatabaseError> {
        Ok(self.conn.try_clone()?)
    }

    /// User tables, excluding tabport's bookkeeping tables.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DuckDb`] if the catalog query fails.
    pub fn table_names(&self) -> Result<Vec<String>, DatabaseError> {
        catalog::table_names(&self.conn)
    }

    /// Column names of `table`, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Validation`] for an empty name or
    /// [`DatabaseError::DuckDb`] if the catalog query fails.
    pub fn column_names(&self, table: &str) -> Result<Vec<String>, DatabaseError> {
        catalog::column_names(&self.conn, table)
    }

    fn init_schema(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(schemas::CREATE_EXPORT_CONFIG)?;
        self.conn.execute_batch(schemas::CREATE_EXPORT_CONFIG_COLUMNS)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_in_memory_creates_bookkeeping_tables() {
        let store = TableStore::open_in_memory().expect("open store");
        let count: i64 = store
            .conn()
            .query_row(
                "SELECT count(*) FROM information_schema.tables WHERE table_name LIKE 'tabport_%'",
                [],
                |row| row.get(0),
            )
            .expect("count tables");
        assert_eq!(count, 2);
        assert!(store.table_names().expect("list tables").is_empty());
    }

    #[test]
    fn open_is_idempotent_on_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.duckdb");
        let path = path.to_string_lossy();
        drop(TableStore::open(&path).expect("first open"));
        let store = TableStore::open(&path).expect("second open");
        assert!(store.table_names().expect("list tables").is_empty());
    }
}
