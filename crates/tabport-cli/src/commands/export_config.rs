use anyhow::{Context, bail};
use serde::Serialize;
use tabport_core::entities::AutomaticExportConfig;
use tabport_engine::maintenance::run_automatic_exports;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ExportConfigCommands;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct ConfigListResponse {
    configs: Vec<AutomaticExportConfig>,
}

#[derive(Debug, Serialize)]
struct RemoveResponse {
    id: i32,
    removed: bool,
}

/// Handle `tabport export-config`.
pub fn handle(
    action: &ExportConfigCommands,
    ctx: &mut AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        ExportConfigCommands::Add {
            table,
            output_file,
            columns,
            transform,
            data_source,
        } => {
            let config = AutomaticExportConfig {
                id: 0,
                table_name: table.clone(),
                output_file_name: output_file.clone(),
                columns: columns.clone(),
                transform_id: transform.clone(),
                data_source: data_source.clone(),
            };
            let stored = add(ctx, &config)?;
            output(&stored, flags.format)
        }
        ExportConfigCommands::List { with_columns } => {
            let configs = ctx
                .store
                .list_export_configs(*with_columns)
                .context("failed to list export configurations")?;
            output(&ConfigListResponse { configs }, flags.format)
        }
        ExportConfigCommands::Get { id } => {
            let config = ctx
                .store
                .find_export_config(*id)
                .context("failed to read export configuration")?
                .with_context(|| format!("export configuration {id} not found"))?;
            output(&config, flags.format)
        }
        ExportConfigCommands::Remove { id } => {
            let removed = ctx
                .store
                .delete_export_config(*id)
                .context("failed to delete export configuration")?;
            if !removed {
                bail!("export configuration {id} not found");
            }
            output(&RemoveResponse { id: *id, removed }, flags.format)
        }
        ExportConfigCommands::Run => {
            let summary = run_automatic_exports(&ctx.store, &ctx.config, &ctx.exporter()?)
                .context("automatic export run failed")?;
            output(&summary, flags.format)
        }
    }
}

/// Store `config` once its transform and data source are known.
fn add(
    ctx: &mut AppContext,
    config: &AutomaticExportConfig,
) -> anyhow::Result<AutomaticExportConfig> {
    if ctx.exporter()?.transforms().get(&config.transform_id).is_none() {
        bail!("unknown transform '{}'", config.transform_id);
    }
    ctx.config.database.path_for(&config.data_source)?;
    ctx.store
        .insert_export_config(config)
        .context("failed to store export configuration")
}
