use std::path::Path;

use anyhow::{Context, bail};
use serde::Serialize;
use tabport_core::result::ImportResult;
use tabport_engine::{ImportJobs, ImportOptions};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ImportArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct ImportResponse {
    file: String,
    table: String,
    options: ImportOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(flatten)]
    result: ImportResult,
}

/// Handle `tabport import`.
pub async fn handle(
    args: &ImportArgs,
    ctx: &mut AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let response = run(args, ctx).await?;
    output(&response, flags.format)
}

async fn run(args: &ImportArgs, ctx: &mut AppContext) -> anyhow::Result<ImportResponse> {
    let table = match &args.table {
        Some(table) => table.clone(),
        None => table_from_file(&args.file)?,
    };
    let options = options(args, ctx);
    let importer = ctx.importer()?;
    let mut source = ctx
        .sources()?
        .open_path(&args.file)
        .with_context(|| format!("failed to open {}", args.file.display()))?;

    let result = if args.background {
        let key = args.key.clone().context("--background needs --key")?;
        let jobs = ImportJobs::from_current()?;
        let conn = ctx.store.try_clone_connection()?;
        jobs.submit_import(key.clone(), conn, source, table.clone(), importer, options)
            .await
            .context("import job did not complete")?;
        jobs.take_result(&key)
            .with_context(|| format!("import job '{key}' left no result"))?
    } else {
        let result = importer.run(ctx.store.conn_mut(), source.as_mut(), &table, options);
        source.close();
        result
    };

    Ok(ImportResponse {
        file: args.file.display().to_string(),
        table,
        options,
        key: args.key.clone().filter(|_| args.background),
        result,
    })
}

/// Command-line switches turn options on; configured defaults still apply.
const fn options(args: &ImportArgs, ctx: &AppContext) -> ImportOptions {
    let configured = ImportOptions::from_config(&ctx.config.import);
    ImportOptions {
        update_existing: configured.update_existing || args.update,
        stop_on_errors: configured.stop_on_errors || args.stop_on_errors,
        empty_table_first: configured.empty_table_first || args.empty_table,
    }
}

fn table_from_file(file: &Path) -> anyhow::Result<String> {
    match file.file_stem().and_then(|stem| stem.to_str()) {
        Some(stem) if !stem.is_empty() => Ok(stem.to_string()),
        _ => bail!("cannot derive a table name from {}; pass --table", file.display()),
    }
}
