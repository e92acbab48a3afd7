//! Column metadata discovery through `information_schema`.

use duckdb::Connection;
use std::collections::HashMap;
use tabport_core::column::ColumnDescriptor;
use tabport_core::errors::validate_request;

use crate::DatabaseError;
use crate::schemas::INTERNAL_TABLE_PREFIX;

/// `(column_name, data_type, is_nullable)` rows of one table.
pub const COLUMN_TYPES_SQL: &str = "SELECT DISTINCT column_name, data_type, is_nullable \
     FROM information_schema.columns WHERE table_name = ?";

/// Distinct column names of one table, in declaration order.
pub const COLUMN_NAMES_SQL: &str = "SELECT column_name FROM information_schema.columns \
     WHERE table_name = ? GROUP BY column_name ORDER BY min(ordinal_position)";

/// Base tables of the main schema.
pub const TABLE_NAMES_SQL: &str = "SELECT table_name FROM information_schema.tables \
     WHERE table_schema = 'main' AND table_type = 'BASE TABLE' ORDER BY table_name";

/// Resolve `requested` columns of `table` into typed descriptors.
///
/// Names reported by the catalog are lowercased before matching. The result
/// follows the order of `requested`, and its first entry is the primary key.
/// Columns declared `NOT NULL` come back with `nullable == false`.
///
/// # Errors
///
/// - [`DatabaseError::Validation`] for an empty table name or column list,
///   before any query runs.
/// - [`DatabaseError::ColumnNotFound`] if a requested name is absent from the
///   catalog or appears twice in `requested`.
/// - [`DatabaseError::DuckDb`] if the catalog query fails.
pub fn resolve_columns(
    conn: &Connection,
    table: &str,
    requested: &[String],
) -> Result<Vec<ColumnDescriptor>, DatabaseError> {
    validate_request(table, requested)?;
    let primary_key = &requested[0];

    let mut stmt = conn.prepare(COLUMN_TYPES_SQL)?;
    let rows = stmt.query_map([table], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
        ))
    })?;

    let mut by_name = HashMap::new();
    for row in rows {
        let (name, data_type, is_nullable) = row?;
        let name = name.to_lowercase();
        if requested.contains(&name) {
            let is_primary_key = &name == primary_key;
            let nullable = !is_nullable.is_some_and(|flag| flag.eq_ignore_ascii_case("no"));
            let descriptor = ColumnDescriptor::from_catalog(&name, &data_type, is_primary_key)
                .with_nullable(nullable);
            by_name.insert(name, descriptor);
        }
    }

    requested
        .iter()
        .map(|column| {
            by_name
                .remove(column)
                .ok_or_else(|| DatabaseError::ColumnNotFound {
                    table: table.to_string(),
                    column: column.clone(),
                })
        })
        .collect()
}

/// Distinct column names of `table`.
///
/// # Errors
///
/// Returns [`DatabaseError::Validation`] for an empty table name and
/// [`DatabaseError::DuckDb`] if the catalog query fails.
pub fn column_names(conn: &Connection, table: &str) -> Result<Vec<String>, DatabaseError> {
    if table.trim().is_empty() {
        return Err(DatabaseError::Validation("table name is empty".to_string()));
    }
    let mut stmt = conn.prepare(COLUMN_NAMES_SQL)?;
    let names = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

/// User tables available for import and export.
///
/// # Errors
///
/// Returns [`DatabaseError::DuckDb`] if the catalog query fails.
pub fn table_names(conn: &Connection) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(TABLE_NAMES_SQL)?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names
        .into_iter()
        .filter(|name| !name.starts_with(INTERNAL_TABLE_PREFIX))
        .collect())
}
