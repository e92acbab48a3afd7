use std::path::PathBuf;

use clap::{Args, Subcommand};

use super::subcommands::ExportConfigCommands;

/// All top-level commands.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// List the tables of the database.
    Tables,
    /// List the columns of a table in catalog order.
    Columns {
        /// Table name.
        table: String,
    },
    /// Import a file into a table.
    Import(ImportArgs),
    /// Export columns of a table.
    Export(ExportArgs),
    /// Stored automatic export configurations.
    ExportConfig {
        #[command(subcommand)]
        action: ExportConfigCommands,
    },
    /// Import every importable file of the configured source folder.
    Sweep,
    /// Remove background export files older than the configured lifetime.
    Clean,
}

/// Arguments for `tabport import`.
#[derive(Clone, Debug, Args)]
pub struct ImportArgs {
    /// File to import; its extension selects the source format.
    pub file: PathBuf,
    /// Target table (defaults to the file stem).
    #[arg(long)]
    pub table: Option<String>,
    /// Update rows whose primary key already exists.
    #[arg(long)]
    pub update: bool,
    /// Roll back and stop at the first failing row.
    #[arg(long)]
    pub stop_on_errors: bool,
    /// Delete every row of the table before importing.
    #[arg(long)]
    pub empty_table: bool,
    /// Run as a background job and wait for its result.
    #[arg(long, requires = "key")]
    pub background: bool,
    /// Job key for `--background`.
    #[arg(long)]
    pub key: Option<String>,
}

/// Arguments for `tabport export`.
#[derive(Clone, Debug, Args)]
pub struct ExportArgs {
    /// Table to export.
    pub table: String,
    /// Columns to export; the first one must be the primary key.
    #[arg(long, required = true, value_delimiter = ',')]
    pub columns: Vec<String>,
    /// Output transform.
    #[arg(long, default_value = "none")]
    pub transform: String,
    /// Write to this file instead of stdout.
    #[arg(long, conflicts_with = "background")]
    pub output: Option<PathBuf>,
    /// Run as a background job writing under the jobs folder.
    #[arg(long, requires = "key")]
    pub background: bool,
    /// Job key for `--background`.
    #[arg(long)]
    pub key: Option<String>,
}
