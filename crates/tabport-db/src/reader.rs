//! Read rows of a table as interchange text.

use duckdb::Connection;
use duckdb::types::Value;
use tabport_core::codec::RowCodec;
use tabport_core::column::ColumnDescriptor;
use tabport_core::element::{Row, RowElement};

use crate::DatabaseError;
use crate::catalog::resolve_columns;
use crate::sql::select_statement;
use crate::values::from_sql_value;

/// Stream every row of `table` to `visit`, one [`Row`] per result row.
///
/// Elements follow the order of `requested`. Returns the resolved schema once
/// all rows were visited. Stops at the first error from the query, the codec,
/// or `visit`.
///
/// # Errors
///
/// - [`DatabaseError::Validation`] / [`DatabaseError::ColumnNotFound`] from
///   schema resolution.
/// - [`DatabaseError::Codec`] for a column of unsupported type (raised before
///   the query runs) or a value that cannot be rendered.
/// - Any error returned by `visit`.
pub fn visit_rows<E, F>(
    conn: &Connection,
    table: &str,
    requested: &[String],
    codec: &RowCodec,
    mut visit: F,
) -> Result<Vec<ColumnDescriptor>, E>
where
    E: From<DatabaseError>,
    F: FnMut(Row) -> Result<(), E>,
{
    let columns = resolve_columns(conn, table, requested)?;
    for column in &columns {
        column.semantic_type().map_err(DatabaseError::from)?;
    }

    let mut stmt = conn
        .prepare(&select_statement(table, &columns))
        .map_err(DatabaseError::from)?;
    let mut rows = stmt.query([]).map_err(DatabaseError::from)?;
    while let Some(row) = rows.next().map_err(DatabaseError::from)? {
        let mut elements = Vec::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            let value = row.get::<_, Value>(index).map_err(DatabaseError::from)?;
            let text = codec
                .encode(column, &from_sql_value(value))
                .map_err(DatabaseError::from)?;
            elements.push(RowElement::new(column.name.clone(), text));
        }
        visit(elements)?;
    }
    Ok(columns)
}

/// Read every row of `table` into memory.
///
/// # Errors
///
/// See [`visit_rows`].
pub fn read_rows(
    conn: &Connection,
    table: &str,
    requested: &[String],
    codec: &RowCodec,
) -> Result<Vec<Row>, DatabaseError> {
    let mut out = Vec::new();
    visit_rows(conn, table, requested, codec, |row| {
        out.push(row);
        Ok::<_, DatabaseError>(())
    })?;
    Ok(out)
}
