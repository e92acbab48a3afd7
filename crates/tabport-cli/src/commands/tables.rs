use anyhow::Context;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct TablesResponse {
    tables: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ColumnsResponse<'a> {
    table: &'a str,
    columns: Vec<String>,
}

/// Handle `tabport tables`.
pub fn handle_tables(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let tables = ctx.store.table_names().context("failed to list tables")?;
    output(&TablesResponse { tables }, flags.format)
}

/// Handle `tabport columns <table>`.
pub fn handle_columns(table: &str, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let columns = ctx
        .store
        .column_names(table)
        .with_context(|| format!("failed to list columns of '{table}'"))?;
    output(&ColumnsResponse { table, columns }, flags.format)
}
