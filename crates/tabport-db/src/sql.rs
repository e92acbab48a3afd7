//! SQL text for the generic row statements.
//!
//! Table and column names are interpolated unquoted. They always come from a
//! successful catalog resolution, so only names that exist in the database
//! reach these builders.

use tabport_core::column::ColumnDescriptor;

/// `INSERT INTO t(c1,...,cN) VALUES (?,...,?);`
#[must_use]
pub fn insert_statement(table: &str, columns: &[ColumnDescriptor]) -> String {
    let names = columns
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(",");
    let placeholders = vec!["?"; columns.len()].join(",");
    format!("INSERT INTO {table}({names}) VALUES ({placeholders});")
}

/// `UPDATE t SET a = ? , b = ? WHERE pk = ?`
///
/// Returns `None` when every column is a key column, since there is nothing
/// to set.
#[must_use]
pub fn update_statement(table: &str, columns: &[ColumnDescriptor]) -> Option<String> {
    let assignments = columns
        .iter()
        .filter(|c| !c.is_primary_key)
        .map(|c| format!("{} = ?", c.name))
        .collect::<Vec<_>>();
    if assignments.is_empty() {
        return None;
    }
    let conditions = columns
        .iter()
        .filter(|c| c.is_primary_key)
        .map(|c| format!("{} = ?", c.name))
        .collect::<Vec<_>>();
    Some(format!(
        "UPDATE {table} SET {} WHERE {}",
        assignments.join(" , "),
        conditions.join(" AND ")
    ))
}

/// `SELECT pk FROM t WHERE pk = ?`
#[must_use]
pub fn exists_statement(table: &str, key: &ColumnDescriptor) -> String {
    format!("SELECT {key} FROM {table} WHERE {key} = ?", key = key.name)
}

/// `SELECT c1,c2,...,cN FROM t`
#[must_use]
pub fn select_statement(table: &str, columns: &[ColumnDescriptor]) -> String {
    let names = columns
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(",");
    format!("SELECT {names} FROM {table}")
}

/// `DELETE FROM t`
#[must_use]
pub fn delete_all_statement(table: &str) -> String {
    format!("DELETE FROM {table}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn schema() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::from_catalog("pk", "INTEGER", true),
            ColumnDescriptor::from_catalog("x", "VARCHAR", false),
            ColumnDescriptor::from_catalog("y", "DOUBLE", false),
        ]
    }

    #[test]
    fn insert_lists_columns_and_placeholders() {
        assert_eq!(
            insert_statement("t", &schema()),
            "INSERT INTO t(pk,x,y) VALUES (?,?,?);"
        );
    }

    #[test]
    fn update_sets_non_keys_and_filters_on_key() {
        assert_eq!(
            update_statement("t", &schema()).as_deref(),
            Some("UPDATE t SET x = ? , y = ? WHERE pk = ?")
        );
    }

    #[test]
    fn update_without_non_key_columns_is_none() {
        assert_eq!(update_statement("t", &schema()[..1]), None);
    }

    #[test]
    fn exists_selects_the_key() {
        assert_eq!(
            exists_statement("t", &schema()[0]),
            "SELECT pk FROM t WHERE pk = ?"
        );
    }

    #[test]
    fn select_keeps_request_order() {
        let mut columns = schema();
        columns.reverse();
        assert_eq!(select_statement("t", &columns), "SELECT y,x,pk FROM t");
    }
}
