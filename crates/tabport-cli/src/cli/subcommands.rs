use clap::Subcommand;

/// Export configuration subcommands.
#[derive(Clone, Debug, Subcommand)]
pub enum ExportConfigCommands {
    /// Store a new configuration.
    Add {
        #[arg(long)]
        table: String,
        /// File name inside the export output folder.
        #[arg(long)]
        output_file: String,
        #[arg(long, required = true, value_delimiter = ',')]
        columns: Vec<String>,
        #[arg(long, default_value = "none")]
        transform: String,
        #[arg(long, default_value = "default")]
        data_source: String,
    },
    /// List stored configurations.
    List {
        #[arg(long)]
        with_columns: bool,
    },
    /// Show one configuration.
    Get { id: i32 },
    /// Delete one configuration.
    Remove { id: i32 },
    /// Run every stored configuration now.
    Run,
}
