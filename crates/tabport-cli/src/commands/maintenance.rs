use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use tabport_engine::maintenance::{FolderImport, clean_expired_exports, import_folder};

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct SweepResponse {
    imports: Vec<FolderImport>,
}

/// Handle `tabport sweep`.
pub fn handle_sweep(ctx: &mut AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let registry = ctx.sources()?;
    let importer = ctx.importer()?;
    let imports = import_folder(
        ctx.store.conn_mut(),
        &ctx.config.import,
        &registry,
        &importer,
    )
    .with_context(|| format!("failed to sweep {}", ctx.config.import.source_folder))?;
    output(&SweepResponse { imports }, flags.format)
}

/// Handle `tabport clean`.
pub fn handle_clean(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let folder = Path::new(&ctx.config.export.jobs_folder);
    let summary = clean_expired_exports(folder, ctx.config.export.file_lifetime())
        .with_context(|| format!("failed to clean {}", folder.display()))?;
    output(&summary, flags.format)
}
