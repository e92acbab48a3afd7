use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(
    command: Commands,
    ctx: &mut AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match command {
        Commands::Tables => commands::tables::handle_tables(ctx, flags),
        Commands::Columns { table } => commands::tables::handle_columns(&table, ctx, flags),
        Commands::Import(args) => commands::import::handle(&args, ctx, flags).await,
        Commands::Export(args) => commands::export::handle(&args, ctx, flags).await,
        Commands::ExportConfig { action } => commands::export_config::handle(&action, ctx, flags),
        Commands::Sweep => commands::maintenance::handle_sweep(ctx, flags),
        Commands::Clean => commands::maintenance::handle_clean(ctx, flags),
    }
}
