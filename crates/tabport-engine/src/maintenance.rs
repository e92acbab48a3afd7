//! Unattended runs: stored exports, the import folder sweep, and cleanup of
//! background export files. Scheduling is left to the operator (cron, systemd
//! timers); each function performs one pass.

use duckdb::Connection;
use serde::Serialize;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tabport_config::{DEFAULT_DATA_SOURCE, ImportConfig, TabportConfig};
use tabport_core::entities::AutomaticExportConfig;
use tabport_core::result::ImportResult;
use tabport_db::TableStore;

use crate::error::EngineError;
use crate::export::Exporter;
use crate::import::{ImportOptions, Importer};
use crate::source::SourceRegistry;

// ---------------------------------------------------------------------------
// Automatic exports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportRunSummary {
    pub succeeded: usize,
    pub total: usize,
}

/// Export every stored configuration into `<output_folder>/<output_file_name>`.
///
/// Configurations on the default data source read through `store`; others
/// open their configured database once per run. A configuration that fails
/// counts against `succeeded` and does not stop the run.
///
/// # Errors
///
/// Returns [`EngineError::Database`] if the configurations cannot be listed.
pub fn run_automatic_exports(
    store: &TableStore,
    config: &TabportConfig,
    exporter: &Exporter,
) -> Result<ExportRunSummary, EngineError> {
    let configs = store.list_export_configs(true)?;
    let output_folder = Path::new(&config.export.output_folder);
    let mut connections: HashMap<String, Connection> = HashMap::new();
    let mut summary = ExportRunSummary {
        succeeded: 0,
        total: configs.len(),
    };

    for export in &configs {
        let conn = match data_source_connection(store, config, &mut connections, export) {
            Ok(conn) => conn,
            Err(error) => {
                tracing::error!(id = export.id, %error, "export data source unavailable");
                continue;
            }
        };
        let path = output_folder.join(&export.output_file_name);
        if exporter.export_to_file(
            &path,
            conn,
            &export.table_name,
            &export.columns,
            &export.transform_id,
        ) {
            summary.succeeded += 1;
        }
    }

    tracing::info!(
        succeeded = summary.succeeded,
        total = summary.total,
        "automatic exports finished"
    );
    Ok(summary)
}

fn data_source_connection<'a>(
    store: &'a TableStore,
    config: &TabportConfig,
    connections: &'a mut HashMap<String, Connection>,
    export: &AutomaticExportConfig,
) -> Result<&'a Connection, EngineError> {
    let name = export.data_source.trim();
    if name.is_empty() || name == DEFAULT_DATA_SOURCE {
        return Ok(store.conn());
    }
    match connections.entry(name.to_string()) {
        Entry::Occupied(entry) => Ok(entry.into_mut()),
        Entry::Vacant(entry) => {
            let path = config.database.path_for(name)?;
            Ok(entry.insert(Connection::open(path)?))
        }
    }
}

// ---------------------------------------------------------------------------
// Export file cleanup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupSummary {
    pub removed: usize,
    pub ignored: usize,
}

/// Remove files older than `lifetime` from every per-key folder of
/// `jobs_folder`.
///
/// Files that cannot be removed are counted as ignored. A missing
/// `jobs_folder` is an empty pass.
///
/// # Errors
///
/// Returns [`EngineError::Io`] if a folder cannot be listed.
pub fn clean_expired_exports(
    jobs_folder: &Path,
    lifetime: Duration,
) -> Result<CleanupSummary, EngineError> {
    let mut summary = CleanupSummary::default();
    if !jobs_folder.is_dir() {
        return Ok(summary);
    }
    let now = SystemTime::now();

    for key_folder in fs::read_dir(jobs_folder)? {
        let key_folder = key_folder?.path();
        if !key_folder.is_dir() {
            continue;
        }
        for file in fs::read_dir(&key_folder)? {
            let file = file?.path();
            if !file.is_file() || !is_expired(&file, now, lifetime) {
                continue;
            }
            match fs::remove_file(&file) {
                Ok(()) => summary.removed += 1,
                Err(error) => {
                    tracing::warn!(path = %file.display(), %error, "expired export not removed");
                    summary.ignored += 1;
                }
            }
        }
    }

    tracing::info!(
        removed = summary.removed,
        ignored = summary.ignored,
        "expired export files cleaned"
    );
    Ok(summary)
}

fn is_expired(path: &Path, now: SystemTime, lifetime: Duration) -> bool {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| now.duration_since(modified).ok())
        .is_some_and(|age| age > lifetime)
}

// ---------------------------------------------------------------------------
// Folder import sweep
// ---------------------------------------------------------------------------

/// Outcome for one file of the sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderImport {
    pub file: PathBuf,
    pub table: String,
    pub result: ImportResult,
    pub removed: bool,
}

/// Import every file of `config.source_folder` into the table named by its
/// stem. The stem matches `importable_tables` case-insensitively and the
/// configured spelling is the table imported into.
///
/// Files whose stem is not an importable table, or whose extension has no
/// registered source, are skipped. A file is deleted once its import
/// created, updated, or ignored at least one row.
///
/// # Errors
///
/// Returns [`EngineError::Io`] if the folder cannot be listed.
pub fn import_folder(
    conn: &mut Connection,
    config: &ImportConfig,
    registry: &SourceRegistry,
    importer: &Importer,
) -> Result<Vec<FolderImport>, EngineError> {
    let folder = Path::new(&config.source_folder);
    if !folder.is_dir() {
        tracing::warn!(folder = %folder.display(), "import folder does not exist or is not a directory");
        return Ok(Vec::new());
    }

    let mut files = fs::read_dir(folder)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    files.sort();

    let options = ImportOptions::from_config(config);
    let mut imports = Vec::new();
    for file in files {
        if !file.is_file() {
            continue;
        }
        let table = file
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| config.importable_table(stem))
            .map(str::to_string);
        let Some(table) = table.filter(|_| registry.supports(&file)) else {
            tracing::debug!(file = %file.display(), "skipped by import sweep");
            continue;
        };

        let mut source = match registry.open_path(&file) {
            Ok(source) => source,
            Err(error) => {
                tracing::error!(file = %file.display(), %error, "import source not opened");
                continue;
            }
        };
        let result = importer.run(conn, source.as_mut(), &table, options);
        source.close();
        for message in &result.messages {
            tracing::debug!(
                file = %file.display(),
                item = message.item_number,
                severity = %message.severity,
                "{}",
                message.text
            );
        }

        let removed = result.processed() > 0 && remove_imported(&file);
        imports.push(FolderImport {
            file,
            table,
            result,
            removed,
        });
    }
    Ok(imports)
}

fn remove_imported(file: &Path) -> bool {
    match fs::remove_file(file) {
        Ok(()) => true,
        Err(error) => {
            tracing::warn!(file = %file.display(), %error, "imported file not removed");
            false
        }
    }
}
