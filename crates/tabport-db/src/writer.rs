//! Transactional bulk writer bound to one table and one resolved schema.
//!
//! ```text
//! open → committed
//!      → rolled_back
//!      → aborted → rolled_back
//! ```
//!
//! A writer owns its `DuckDB` transaction. Dropping a writer that is still
//! open (or aborted) rolls the transaction back. `DuckDB` invalidates a
//! transaction once any statement in it fails, so a failed statement moves
//! the writer to `aborted`, where only `rollback` is accepted. Shape, codec
//! and NULL errors (a NULL key, or NULL in a `NOT NULL` column) are detected
//! before any statement runs and leave the writer open.

use duckdb::{Connection, Transaction, params_from_iter};
use std::fmt;
use tabport_core::codec::{CellValue, RowCodec};
use tabport_core::column::ColumnDescriptor;
use tabport_core::element::RowElement;
use tabport_core::errors::validate_request;

use crate::DatabaseError;
use crate::catalog::resolve_columns;
use crate::sql;
use crate::values::to_sql_value;

// ---------------------------------------------------------------------------
// WriterState
// ---------------------------------------------------------------------------

/// Observable state of a [`BulkWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriterState {
    Open,
    Aborted,
    Committed,
    RolledBack,
}

impl WriterState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Aborted => "aborted",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        }
    }
}

impl fmt::Display for WriterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

enum Session<'conn> {
    Open(Transaction<'conn>),
    Aborted(Transaction<'conn>),
    Closed(WriterState),
}

impl Session<'_> {
    const fn state(&self) -> WriterState {
        match self {
            Self::Open(_) => WriterState::Open,
            Self::Aborted(_) => WriterState::Aborted,
            Self::Closed(state) => *state,
        }
    }
}

/// SQL text and parameters ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    pub sql: String,
    pub params: Vec<CellValue>,
}

// ---------------------------------------------------------------------------
// BulkWriter
// ---------------------------------------------------------------------------

/// Inserts, updates, and existence checks against one table inside a single
/// transaction.
pub struct BulkWriter<'conn> {
    table: String,
    columns: Vec<ColumnDescriptor>,
    codec: RowCodec,
    insert_sql: String,
    update_sql: Option<String>,
    exists_sql: String,
    session: Session<'conn>,
}

impl<'conn> BulkWriter<'conn> {
    /// Open a transaction on `conn` and resolve `requested` columns of `table`.
    ///
    /// The first requested column is the primary key.
    ///
    /// # Errors
    ///
    /// - [`DatabaseError::Validation`] for an empty table name or column list.
    /// - [`DatabaseError::TransactionUnavailable`] if the transaction cannot start.
    /// - [`DatabaseError::ColumnNotFound`] if the schema does not resolve.
    pub fn begin(
        conn: &'conn mut Connection,
        table: &str,
        requested: &[String],
        codec: RowCodec,
    ) -> Result<Self, DatabaseError> {
        validate_request(table, requested)?;
        let tx = conn
            .transaction()
            .map_err(DatabaseError::TransactionUnavailable)?;
        let columns = resolve_columns(&tx, table, requested)?;

        let key = &columns[0];
        let exists_sql = sql::exists_statement(table, key);
        Ok(Self {
            table: table.to_string(),
            insert_sql: sql::insert_statement(table, &columns),
            update_sql: sql::update_statement(table, &columns),
            exists_sql,
            columns,
            codec,
            session: Session::Open(tx),
        })
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Resolved schema, in request order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    #[must_use]
    pub const fn state(&self) -> WriterState {
        self.session.state()
    }

    /// Insert one row. Every element is bound in schema order.
    ///
    /// # Errors
    ///
    /// Returns a shape, codec, or database error for this row, or a
    /// transaction state error if the writer is no longer open.
    pub fn insert(&mut self, elements: &[RowElement]) -> Result<(), DatabaseError> {
        self.ensure_open()?;
        let bound = self.bind_insert(elements)?;
        self.execute(&bound)?;
        Ok(())
    }

    /// Update the row identified by the key element.
    ///
    /// Non-key values are bound first, then key values. Returns the number of
    /// rows changed; a schema made only of key columns changes nothing.
    ///
    /// # Errors
    ///
    /// Returns a shape, codec, or database error for this row, or a
    /// transaction state error if the writer is no longer open.
    pub fn update(&mut self, elements: &[RowElement]) -> Result<usize, DatabaseError> {
        self.ensure_open()?;
        match self.bind_update(elements)? {
            Some(bound) => self.execute(&bound),
            None => Ok(0),
        }
    }

    /// Whether a row with the key element's value exists.
    ///
    /// Runs inside the writer's transaction, so rows written earlier in the
    /// same session are visible.
    ///
    /// # Errors
    ///
    /// Returns a shape, codec, or database error for this row, or a
    /// transaction state error if the writer is no longer open.
    pub fn exists_by_primary_key(
        &mut self,
        elements: &[RowElement],
    ) -> Result<bool, DatabaseError> {
        self.ensure_open()?;
        let bound = self.bind_exists(elements)?;
        self.with_transaction(|tx| {
            let mut stmt = tx.prepare_cached(&bound.sql)?;
            let mut rows = stmt.query(params_from_iter(bound.params.iter().map(to_sql_value)))?;
            let found = rows.next()?.is_some();
            Ok(found)
        })
    }

    /// Delete every row of the table inside the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DuckDb`] if the delete fails, or a transaction
    /// state error if the writer is no longer open.
    pub fn empty_table(&mut self) -> Result<usize, DatabaseError> {
        self.ensure_open()?;
        let statement = sql::delete_all_statement(&self.table);
        self.with_transaction(|tx| tx.execute(&statement, []))
    }

    /// Commit the transaction. One-shot.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::TransactionAborted`] after a failed statement,
    /// [`DatabaseError::TransactionClosed`] if already finished, or
    /// [`DatabaseError::DuckDb`] if the commit itself fails (the writer is then
    /// rolled back).
    pub fn commit(&mut self) -> Result<(), DatabaseError> {
        match std::mem::replace(&mut self.session, Session::Closed(WriterState::Committed)) {
            Session::Open(tx) => {
                if let Err(error) = tx.commit() {
                    self.session = Session::Closed(WriterState::RolledBack);
                    return Err(error.into());
                }
                tracing::debug!(table = %self.table, "bulk writer committed");
                Ok(())
            }
            aborted @ Session::Aborted(_) => {
                self.session = aborted;
                Err(DatabaseError::TransactionAborted)
            }
            Session::Closed(state) => {
                self.session = Session::Closed(state);
                Err(DatabaseError::TransactionClosed { state })
            }
        }
    }

    /// Roll the transaction back. One-shot; allowed from open or aborted.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::TransactionClosed`] if already finished, or
    /// [`DatabaseError::DuckDb`] if the rollback fails.
    pub fn rollback(&mut self) -> Result<(), DatabaseError> {
        match std::mem::replace(&mut self.session, Session::Closed(WriterState::RolledBack)) {
            Session::Open(tx) | Session::Aborted(tx) => {
                tx.rollback()?;
                tracing::debug!(table = %self.table, "bulk writer rolled back");
                Ok(())
            }
            Session::Closed(state) => {
                self.session = Session::Closed(state);
                Err(DatabaseError::TransactionClosed { state })
            }
        }
    }

    // ── Binding ─────────────────────────────────────────────────────────

    fn bind_insert(&self, elements: &[RowElement]) -> Result<BoundStatement, DatabaseError> {
        self.check_shape(elements)?;
        let params = self
            .columns
            .iter()
            .zip(elements)
            .map(|(column, element)| self.decode(column, element))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BoundStatement {
            sql: self.insert_sql.clone(),
            params,
        })
    }

    fn bind_update(
        &self,
        elements: &[RowElement],
    ) -> Result<Option<BoundStatement>, DatabaseError> {
        self.check_shape(elements)?;
        let Some(sql) = &self.update_sql else {
            return Ok(None);
        };
        let pairs = self.columns.iter().zip(elements);
        let non_keys = pairs.clone().filter(|(column, _)| !column.is_primary_key);
        let keys = pairs.filter(|(column, _)| column.is_primary_key);
        let params = non_keys
            .chain(keys)
            .map(|(column, element)| self.decode(column, element))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(BoundStatement {
            sql: sql.clone(),
            params,
        }))
    }

    fn bind_exists(&self, elements: &[RowElement]) -> Result<BoundStatement, DatabaseError> {
        self.check_count(elements)?;
        let key = &self.columns[0];
        let element = &elements[0];
        check_name(0, key, element)?;
        let value = self.decode(key, element)?;
        Ok(BoundStatement {
            sql: self.exists_sql.clone(),
            params: vec![value],
        })
    }

    fn decode(
        &self,
        column: &ColumnDescriptor,
        element: &RowElement,
    ) -> Result<CellValue, DatabaseError> {
        let value = self.codec.decode(column, element.value.as_deref())?;
        if value.is_null() && !column.accepts_null() {
            return Err(DatabaseError::NullValue {
                column: column.name.clone(),
            });
        }
        Ok(value)
    }

    fn check_count(&self, elements: &[RowElement]) -> Result<(), DatabaseError> {
        if elements.len() == self.columns.len() {
            Ok(())
        } else {
            Err(DatabaseError::ElementCount {
                expected: self.columns.len(),
                found: elements.len(),
            })
        }
    }

    fn check_shape(&self, elements: &[RowElement]) -> Result<(), DatabaseError> {
        self.check_count(elements)?;
        self.columns
            .iter()
            .zip(elements)
            .enumerate()
            .try_for_each(|(position, (column, element))| check_name(position, column, element))
    }

    // ── Execution ───────────────────────────────────────────────────────

    fn ensure_open(&self) -> Result<(), DatabaseError> {
        match self.session {
            Session::Open(_) => Ok(()),
            Session::Aborted(_) => Err(DatabaseError::TransactionAborted),
            Session::Closed(state) => Err(DatabaseError::TransactionClosed { state }),
        }
    }

    fn execute(&mut self, bound: &BoundStatement) -> Result<usize, DatabaseError> {
        self.with_transaction(|tx| {
            let mut stmt = tx.prepare_cached(&bound.sql)?;
            stmt.execute(params_from_iter(bound.params.iter().map(to_sql_value)))
        })
    }

    /// Run `op` on the open transaction, moving to `aborted` if it fails.
    fn with_transaction<T>(
        &mut self,
        op: impl FnOnce(&Transaction<'conn>) -> duckdb::Result<T>,
    ) -> Result<T, DatabaseError> {
        let outcome = match &self.session {
            Session::Open(tx) => op(tx),
            Session::Aborted(_) => return Err(DatabaseError::TransactionAborted),
            Session::Closed(state) => {
                return Err(DatabaseError::TransactionClosed { state: *state });
            }
        };
        outcome.map_err(|error| {
            if let Session::Open(tx) =
                std::mem::replace(&mut self.session, Session::Closed(WriterState::RolledBack))
            {
                self.session = Session::Aborted(tx);
            }
            tracing::debug!(table = %self.table, %error, "statement failed; transaction aborted");
            DatabaseError::DuckDb(error)
        })
    }
}

impl Drop for BulkWriter<'_> {
    fn drop(&mut self) {
        if matches!(self.session, Session::Open(_) | Session::Aborted(_)) {
            tracing::warn!(
                table = %self.table,
                state = %self.session.state(),
                "bulk writer dropped before commit; rolling back"
            );
        }
    }
}

fn check_name(
    position: usize,
    column: &ColumnDescriptor,
    element: &RowElement,
) -> Result<(), DatabaseError> {
    if element.names(&column.name) {
        Ok(())
    } else {
        Err(DatabaseError::ElementName {
            position,
            expected: column.name.clone(),
            found: element.column_name.clone(),
        })
    }
}
