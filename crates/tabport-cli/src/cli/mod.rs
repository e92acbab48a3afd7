pub mod global;
pub mod root_commands;
pub mod subcommands;

use std::path::PathBuf;

use clap::Parser;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// tabport: import files into database tables and export tables to files.
#[derive(Parser)]
#[command(
    name = "tabport",
    version,
    about = "tabport - import and export database tables"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format.
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Only log errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Database file; overrides `database.path` from the configuration.
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,
}

impl Cli {
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            quiet: self.quiet,
            verbose: self.verbose,
            database: self.database.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use pretty_assertions::assert_eq;

    use super::subcommands::ExportConfigCommands;
    use super::{Cli, Commands, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from(["tabport", "--format", "table", "--quiet", "tables"])
            .expect("should parse");
        assert_eq!(cli.format, OutputFormat::Table);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Tables));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["tabport", "columns", "people", "--database", "x.duckdb"])
            .expect("should parse");
        assert_eq!(
            cli.database.as_deref(),
            Some(std::path::Path::new("x.duckdb"))
        );
        assert!(matches!(cli.command, Commands::Columns { table } if table == "people"));
    }

    #[test]
    fn invalid_format_is_rejected() {
        assert!(Cli::try_parse_from(["tabport", "--format", "yaml", "tables"]).is_err());
    }

    #[test]
    fn export_columns_split_on_commas() {
        let cli = Cli::try_parse_from([
            "tabport",
            "export",
            "people",
            "--columns",
            "id,name,born",
            "--transform",
            "csv",
        ])
        .expect("should parse");
        let Commands::Export(args) = cli.command else {
            panic!("expected export");
        };
        assert_eq!(args.columns, vec!["id", "name", "born"]);
        assert_eq!(args.transform, "csv");
        assert!(!args.background);
    }

    #[test]
    fn background_requires_a_key() {
        let parsed =
            Cli::try_parse_from(["tabport", "import", "people.csv", "--background"]);
        assert!(parsed.is_err());

        let cli = Cli::try_parse_from([
            "tabport",
            "import",
            "people.csv",
            "--background",
            "--key",
            "u1",
        ])
        .expect("should parse");
        let Commands::Import(args) = cli.command else {
            panic!("expected import");
        };
        assert_eq!(args.key.as_deref(), Some("u1"));
        assert!(args.table.is_none());
    }

    #[test]
    fn export_config_add_parses() {
        let cli = Cli::try_parse_from([
            "tabport",
            "export-config",
            "add",
            "--table",
            "people",
            "--output-file",
            "people.xml",
            "--columns",
            "id,name",
        ])
        .expect("should parse");
        let Commands::ExportConfig { action } = cli.command else {
            panic!("expected export-config");
        };
        let ExportConfigCommands::Add {
            table,
            columns,
            transform,
            data_source,
            ..
        } = action
        else {
            panic!("expected add");
        };
        assert_eq!(table, "people");
        assert_eq!(columns, vec!["id", "name"]);
        assert_eq!(transform, "none");
        assert_eq!(data_source, "default");
    }
}
