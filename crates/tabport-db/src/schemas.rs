//! DDL for tabport's own bookkeeping tables.

// ── Table DDL ──────────────────────────────────────────────────────────────

/// Prefix of every table owned by tabport; hidden from catalog browsing.
pub const INTERNAL_TABLE_PREFIX: &str = "tabport_";

/// Stored automatic export definitions.
pub const CREATE_EXPORT_CONFIG: &str = "
CREATE TABLE IF NOT EXISTS tabport_export_config (
    id INTEGER PRIMARY KEY,
    table_name VARCHAR NOT NULL,
    output_file_name VARCHAR NOT NULL,
    transform_id VARCHAR NOT NULL DEFAULT 'none',
    data_source VARCHAR NOT NULL DEFAULT 'default'
);
";

/// Ordered column list of each export definition; position 0 is the key.
pub const CREATE_EXPORT_CONFIG_COLUMNS: &str = "
CREATE TABLE IF NOT EXISTS tabport_export_config_columns (
    id_config INTEGER NOT NULL,
    position INTEGER NOT NULL,
    column_name VARCHAR NOT NULL
);
";
