use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use serde::Serialize;
use tabport_engine::{ExportJobs, ExportRequest};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ExportArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct ExportFileResponse {
    table: String,
    transform: String,
    path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
}

/// Handle `tabport export`.
///
/// Without `--output` or `--background` the rendered document goes to stdout
/// as is, whatever the output format.
pub async fn handle(
    args: &ExportArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match run(args, ctx).await? {
        Exported::Inline(document) => {
            println!("{document}");
            Ok(())
        }
        Exported::File(response) => output(&response, flags.format),
    }
}

#[derive(Debug)]
enum Exported {
    Inline(String),
    File(ExportFileResponse),
}

async fn run(args: &ExportArgs, ctx: &AppContext) -> anyhow::Result<Exported> {
    let exporter = ctx.exporter()?;

    if args.background {
        let key = args.key.clone().context("--background needs --key")?;
        let jobs = ExportJobs::from_current()?;
        let request = ExportRequest {
            table: args.table.clone(),
            columns: args.columns.clone(),
            transform_id: args.transform.clone(),
        };
        let (path, handle) = jobs.submit_export(
            key.clone(),
            ctx.store.try_clone_connection()?,
            Arc::new(exporter),
            request,
            Path::new(&ctx.config.export.jobs_folder),
        )?;
        handle.await.context("export job did not complete")?;
        if jobs.take_result(&key) != Some(true) {
            bail!("export job '{key}' failed to write {}", path.display());
        }
        return Ok(Exported::File(ExportFileResponse {
            table: args.table.clone(),
            transform: args.transform.clone(),
            path,
            key: Some(key),
        }));
    }

    match &args.output {
        Some(path) => {
            let written = exporter.export_to_file(
                path,
                ctx.store.conn(),
                &args.table,
                &args.columns,
                &args.transform,
            );
            if !written {
                bail!("failed to export '{}' to {}", args.table, path.display());
            }
            Ok(Exported::File(ExportFileResponse {
                table: args.table.clone(),
                transform: args.transform.clone(),
                path: path.clone(),
                key: None,
            }))
        }
        None => exporter
            .export(ctx.store.conn(), &args.table, &args.columns, &args.transform)
            .map(Exported::Inline)
            .with_context(|| format!("failed to export '{}'", args.table)),
    }
}
