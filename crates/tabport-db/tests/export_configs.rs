//! Automatic export configuration store.

use pretty_assertions::assert_eq;
use tabport_core::entities::AutomaticExportConfig;
use tabport_db::{DatabaseError, TableStore};

fn config(table: &str, columns: &[&str]) -> AutomaticExportConfig {
    AutomaticExportConfig {
        id: 0,
        table_name: table.to_string(),
        output_file_name: format!("{table}.xml"),
        columns: columns.iter().map(ToString::to_string).collect(),
        transform_id: "none".to_string(),
        data_source: "default".to_string(),
    }
}

#[test]
fn insert_assigns_increasing_ids() {
    let mut store = TableStore::open_in_memory().unwrap();
    let first = store.insert_export_config(&config("a", &["id"])).unwrap();
    let second = store.insert_export_config(&config("b", &["id"])).unwrap();
    assert_eq!(first.id, 1);
    assert_eq!(second.id, 2);
}

#[test]
fn find_returns_columns_in_stored_order() {
    let mut store = TableStore::open_in_memory().unwrap();
    let stored = store
        .insert_export_config(&config("people", &["id", "zeta", "alpha", "mid"]))
        .unwrap();
    let found = store.find_export_config(stored.id).unwrap().unwrap();
    assert_eq!(found, stored);
    assert_eq!(found.columns, vec!["id", "zeta", "alpha", "mid"]);
}

#[test]
fn find_missing_is_none() {
    let store = TableStore::open_in_memory().unwrap();
    assert_eq!(store.find_export_config(42).unwrap(), None);
}

#[test]
fn list_loads_columns_on_request() {
    let mut store = TableStore::open_in_memory().unwrap();
    store.insert_export_config(&config("a", &["id", "x"])).unwrap();
    store.insert_export_config(&config("b", &["key"])).unwrap();

    let bare = store.list_export_configs(false).unwrap();
    assert_eq!(bare.len(), 2);
    assert!(bare.iter().all(|c| c.columns.is_empty()));

    let full = store.list_export_configs(true).unwrap();
    let columns = full.iter().map(|c| c.columns.clone()).collect::<Vec<_>>();
    assert_eq!(
        columns,
        vec![
            vec!["id".to_string(), "x".to_string()],
            vec!["key".to_string()]
        ]
    );
}

#[test]
fn update_replaces_fields_and_columns() {
    let mut store = TableStore::open_in_memory().unwrap();
    let mut stored = store.insert_export_config(&config("a", &["id", "x"])).unwrap();
    stored.output_file_name = "renamed.json".to_string();
    stored.transform_id = "json".to_string();
    stored.columns = vec!["id".to_string(), "y".to_string(), "z".to_string()];
    store.update_export_config(&stored).unwrap();

    assert_eq!(store.find_export_config(stored.id).unwrap(), Some(stored));
}

#[test]
fn update_missing_fails() {
    let mut store = TableStore::open_in_memory().unwrap();
    let mut ghost = config("a", &["id"]);
    ghost.id = 9;
    assert!(matches!(
        store.update_export_config(&ghost),
        Err(DatabaseError::ConfigNotFound { id: 9 })
    ));
}

#[test]
fn delete_removes_config_and_columns() {
    let mut store = TableStore::open_in_memory().unwrap();
    let stored = store.insert_export_config(&config("a", &["id", "x"])).unwrap();
    assert!(store.delete_export_config(stored.id).unwrap());
    assert!(!store.delete_export_config(stored.id).unwrap());
    assert_eq!(store.find_export_config(stored.id).unwrap(), None);

    let orphans: i64 = store
        .conn()
        .query_row(
            "SELECT count(*) FROM tabport_export_config_columns",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(orphans, 0);
}

#[test]
fn bookkeeping_tables_are_hidden_from_table_names() {
    let store = TableStore::open_in_memory().unwrap();
    store
        .conn()
        .execute_batch("CREATE TABLE visible (id INTEGER);")
        .unwrap();
    assert_eq!(store.table_names().unwrap(), vec!["visible".to_string()]);
}
