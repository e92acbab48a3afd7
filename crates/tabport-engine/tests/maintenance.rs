//! Maintenance passes: stored exports, folder sweep, export cleanup.

use pretty_assertions::assert_eq;
use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tabport_config::{ImportConfig, TabportConfig};
use tabport_core::entities::AutomaticExportConfig;
use tabport_db::TableStore;
use tabport_engine::maintenance::{
    CleanupSummary, clean_expired_exports, import_folder, run_automatic_exports,
};
use tabport_engine::{Exporter, Importer, SourceRegistry};

fn store() -> TableStore {
    let store = TableStore::open_in_memory().unwrap();
    store
        .conn()
        .execute_batch(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, name VARCHAR);
             INSERT INTO t VALUES (1, 'a');",
        )
        .unwrap();
    store
}

fn age(path: &Path, by: Duration) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() - by).unwrap();
}

// ---------------------------------------------------------------------------
// Cleanup
// ---------------------------------------------------------------------------

#[test]
fn cleanup_removes_only_expired_files() {
    let dir = tempfile::tempdir().unwrap();
    let key = dir.path().join("user-1");
    fs::create_dir_all(&key).unwrap();
    let old = key.join("old.xml");
    let fresh = key.join("fresh.xml");
    fs::write(&old, "x").unwrap();
    fs::write(&fresh, "x").unwrap();
    fs::write(dir.path().join("top-level.xml"), "x").unwrap();
    age(&old, Duration::from_secs(3 * 3600));

    let summary = clean_expired_exports(dir.path(), Duration::from_secs(7200)).unwrap();
    assert_eq!(
        summary,
        CleanupSummary {
            removed: 1,
            ignored: 0
        }
    );
    assert!(!old.exists());
    assert!(fresh.exists());
    assert!(dir.path().join("top-level.xml").exists());
}

#[test]
fn cleanup_of_missing_folder_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let summary =
        clean_expired_exports(&dir.path().join("nope"), Duration::from_secs(1)).unwrap();
    assert_eq!(summary, CleanupSummary::default());
}

// ---------------------------------------------------------------------------
// Stored exports
// ---------------------------------------------------------------------------

#[test]
fn stored_exports_write_into_output_folder() {
    let mut store = store();
    let dir = tempfile::tempdir().unwrap();
    let mut config = TabportConfig::default();
    config.export.output_folder = dir.path().to_string_lossy().into_owned();

    for (file, data_source) in [("t.xml", "default"), ("ghost.xml", "archive")] {
        store
            .insert_export_config(&AutomaticExportConfig {
                id: 0,
                table_name: "t".to_string(),
                output_file_name: file.to_string(),
                columns: vec!["id".to_string(), "name".to_string()],
                transform_id: "none".to_string(),
                data_source: data_source.to_string(),
            })
            .unwrap();
    }

    let summary = run_automatic_exports(&store, &config, &Exporter::default()).unwrap();
    assert_eq!((summary.succeeded, summary.total), (1, 2));
    let xml = fs::read_to_string(dir.path().join("t.xml")).unwrap();
    assert!(xml.contains("<name>a</name>"));
    assert!(!dir.path().join("ghost.xml").exists());
}

// ---------------------------------------------------------------------------
// Folder sweep
// ---------------------------------------------------------------------------

#[test]
fn sweep_imports_allowed_tables_and_removes_files() {
    let mut store = store();
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("t.csv"), "id,name\n2,b\n3,c\n").unwrap();
    fs::write(dir.path().join("other.csv"), "id\n1\n").unwrap();
    fs::write(dir.path().join("t.txt"), "id,name\n4,d\n").unwrap();

    let config = ImportConfig {
        source_folder: dir.path().to_string_lossy().into_owned(),
        importable_tables: vec!["t".to_string()],
        ..ImportConfig::default()
    };
    let registry = SourceRegistry::with_defaults(&config).unwrap();
    let imports =
        import_folder(store.conn_mut(), &config, &registry, &Importer::default()).unwrap();

    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].table, "t");
    assert_eq!(imports[0].result.created, 2);
    assert!(imports[0].removed);
    assert!(!dir.path().join("t.csv").exists());
    assert!(dir.path().join("other.csv").exists());
    assert!(dir.path().join("t.txt").exists());
}

#[test]
fn sweep_keeps_files_that_produced_nothing() {
    let mut store = store();
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("t.csv"), "id,unknown\n2,b\n").unwrap();

    let config = ImportConfig {
        source_folder: dir.path().to_string_lossy().into_owned(),
        importable_tables: vec!["t".to_string()],
        ..ImportConfig::default()
    };
    let registry = SourceRegistry::with_defaults(&config).unwrap();
    let imports =
        import_folder(store.conn_mut(), &config, &registry, &Importer::default()).unwrap();

    assert_eq!(imports.len(), 1);
    assert!(imports[0].result.has_errors());
    assert!(!imports[0].removed);
    assert!(dir.path().join("t.csv").exists());
}

#[test]
fn sweep_imports_into_the_configured_table_spelling() {
    let mut store = store();
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("T.csv"), "id,name\n5,e\n").unwrap();

    let config = ImportConfig {
        source_folder: dir.path().to_string_lossy().into_owned(),
        importable_tables: vec!["t".to_string()],
        ..ImportConfig::default()
    };
    let registry = SourceRegistry::with_defaults(&config).unwrap();
    let imports =
        import_folder(store.conn_mut(), &config, &registry, &Importer::default()).unwrap();

    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].table, "t");
    assert_eq!(imports[0].result.created, 1);
    assert!(imports[0].removed);
    assert!(!dir.path().join("T.csv").exists());
}
