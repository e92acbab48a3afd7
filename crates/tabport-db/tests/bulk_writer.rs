//! Bulk writer integration tests against an in-memory `DuckDB`.
//!
//! - Commit persists, rollback discards
//! - Rows written in a session are visible to `exists_by_primary_key`
//! - Update changes only the keyed row
//! - Null sentinels and typed values reach the table intact
//! - `empty_table` is undone by rollback

use pretty_assertions::assert_eq;
use tabport_core::codec::RowCodec;
use tabport_core::element::RowElement;
use tabport_db::reader::read_rows;
use tabport_db::{BulkWriter, DatabaseError, TableStore, WriterState};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn store() -> TableStore {
    let store = TableStore::open_in_memory().unwrap();
    store
        .conn()
        .execute_batch(
            "CREATE TABLE items (
                id BIGINT PRIMARY KEY,
                label VARCHAR,
                qty INTEGER,
                price DOUBLE,
                added DATE
             );
             INSERT INTO items VALUES (1, 'first', 10, 1.25, DATE '2024-01-02');",
        )
        .unwrap();
    store
}

fn columns() -> Vec<String> {
    ["id", "label", "qty", "price", "added"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn item(id: &str, label: &str, qty: &str, price: &str, added: &str) -> Vec<RowElement> {
    vec![
        RowElement::text("id", id),
        RowElement::text("label", label),
        RowElement::text("qty", qty),
        RowElement::text("price", price),
        RowElement::text("added", added),
    ]
}

fn count(store: &TableStore) -> i64 {
    store
        .conn()
        .query_row("SELECT count(*) FROM items", [], |row| row.get(0))
        .unwrap()
}

// ---------------------------------------------------------------------------
// Commit and rollback
// ---------------------------------------------------------------------------

#[test]
fn committed_inserts_are_persisted() {
    let mut store = store();
    {
        let mut writer =
            BulkWriter::begin(store.conn_mut(), "items", &columns(), RowCodec::default())
                .unwrap();
        writer
            .insert(&item("2", "second", "3", "9.5", "2024-03-01"))
            .unwrap();
        writer.commit().unwrap();
        assert_eq!(writer.state(), WriterState::Committed);
    }
    assert_eq!(count(&store), 2);
}

#[test]
fn rolled_back_inserts_are_discarded() {
    let mut store = store();
    {
        let mut writer =
            BulkWriter::begin(store.conn_mut(), "items", &columns(), RowCodec::default())
                .unwrap();
        writer
            .insert(&item("2", "second", "3", "9.5", "2024-03-01"))
            .unwrap();
        writer.rollback().unwrap();
    }
    assert_eq!(count(&store), 1);
}

#[test]
fn dropping_an_open_writer_discards_its_rows() {
    let mut store = store();
    {
        let mut writer =
            BulkWriter::begin(store.conn_mut(), "items", &columns(), RowCodec::default())
                .unwrap();
        writer
            .insert(&item("2", "second", "3", "9.5", "2024-03-01"))
            .unwrap();
    }
    assert_eq!(count(&store), 1);
}

// ---------------------------------------------------------------------------
// Existence and update
// ---------------------------------------------------------------------------

#[test]
fn exists_sees_rows_of_the_same_session() {
    let mut store = store();
    let mut writer =
        BulkWriter::begin(store.conn_mut(), "items", &columns(), RowCodec::default()).unwrap();
    let fresh = item("5", "fifth", "1", "1.0", "2024-05-05");
    assert!(!writer.exists_by_primary_key(&fresh).unwrap());
    writer.insert(&fresh).unwrap();
    assert!(writer.exists_by_primary_key(&fresh).unwrap());
    assert!(
        writer
            .exists_by_primary_key(&item("1", "", "", "", ""))
            .unwrap()
    );
    writer.rollback().unwrap();
}

#[test]
fn update_changes_only_the_keyed_row() {
    let mut store = store();
    {
        let mut writer =
            BulkWriter::begin(store.conn_mut(), "items", &columns(), RowCodec::default())
                .unwrap();
        writer
            .insert(&item("2", "second", "3", "9.5", "2024-03-01"))
            .unwrap();
        let changed = writer
            .update(&item("1", "renamed", "11", "2.5", "2024-01-03"))
            .unwrap();
        assert_eq!(changed, 1);
        writer.commit().unwrap();
    }

    let rows = read_rows(store.conn(), "items", &columns(), &RowCodec::default()).unwrap();
    let mut rows = rows;
    rows.sort_by(|a, b| a[0].value.cmp(&b[0].value));
    assert_eq!(
        rows,
        vec![
            item("1", "renamed", "11", "2.5", "2024-01-03"),
            item("2", "second", "3", "9.5", "2024-03-01"),
        ]
    );
}

#[test]
fn null_sentinel_is_stored_as_null() {
    let mut store = store();
    {
        let mut writer =
            BulkWriter::begin(store.conn_mut(), "items", &columns(), RowCodec::default())
                .unwrap();
        writer
            .insert(&item("3", "null", "null", "NULL", ""))
            .unwrap();
        writer.commit().unwrap();
    }
    let nulls: i64 = store
        .conn()
        .query_row(
            "SELECT count(*) FROM items WHERE id = 3 AND qty IS NULL AND price IS NULL AND added IS NULL",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(nulls, 1);
}

// ---------------------------------------------------------------------------
// Emptying and failures
// ---------------------------------------------------------------------------

#[test]
fn empty_table_is_undone_by_rollback() {
    let mut store = store();
    {
        let mut writer =
            BulkWriter::begin(store.conn_mut(), "items", &columns(), RowCodec::default())
                .unwrap();
        assert_eq!(writer.empty_table().unwrap(), 1);
        writer.rollback().unwrap();
    }
    assert_eq!(count(&store), 1);
}

#[test]
fn codec_error_leaves_the_session_usable() {
    let mut store = store();
    {
        let mut writer =
            BulkWriter::begin(store.conn_mut(), "items", &columns(), RowCodec::default())
                .unwrap();
        let err = writer
            .insert(&item("2", "second", "three", "9.5", "2024-03-01"))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Codec(_)));
        assert_eq!(writer.state(), WriterState::Open);
        writer
            .insert(&item("2", "second", "3", "9.5", "2024-03-01"))
            .unwrap();
        writer.commit().unwrap();
    }
    assert_eq!(count(&store), 2);
}

#[test]
fn duplicate_key_aborts_the_session() {
    let mut store = store();
    {
        let mut writer =
            BulkWriter::begin(store.conn_mut(), "items", &columns(), RowCodec::default())
                .unwrap();
        writer
            .insert(&item("2", "second", "3", "9.5", "2024-03-01"))
            .unwrap();
        assert!(
            writer
                .insert(&item("1", "dup", "1", "1.0", "2024-01-01"))
                .is_err()
        );
        assert_eq!(writer.state(), WriterState::Aborted);
        writer.rollback().unwrap();
    }
    assert_eq!(count(&store), 1);
}
