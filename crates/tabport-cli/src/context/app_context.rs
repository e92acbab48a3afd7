use std::path::Path;

use anyhow::Context;
use tabport_config::TabportConfig;
use tabport_core::codec::RowCodec;
use tabport_db::TableStore;
use tabport_engine::{Exporter, Importer, SourceRegistry};

use crate::cli::GlobalFlags;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub config: TabportConfig,
    pub store: TableStore,
}

impl AppContext {
    /// Load and validate the configuration, then open the database.
    pub fn init(flags: &GlobalFlags) -> anyhow::Result<Self> {
        let config = TabportConfig::load_with_dotenv().context("failed to load configuration")?;
        Self::open(config, flags.database.as_deref())
    }

    /// Open the database named by `config`, or by `database` when given.
    pub fn open(mut config: TabportConfig, database: Option<&Path>) -> anyhow::Result<Self> {
        config.validate().context("invalid configuration")?;
        if let Some(path) = database {
            config.database.path = path.to_string_lossy().into_owned();
        }

        let store = TableStore::open(&config.database.path)
            .with_context(|| format!("failed to open database {}", config.database.path))?;
        tracing::debug!(path = %config.database.path, "database opened");
        Ok(Self { config, store })
    }

    #[cfg(test)]
    pub fn in_memory(config: TabportConfig) -> Self {
        Self {
            config,
            store: TableStore::open_in_memory().expect("in-memory store"),
        }
    }

    pub fn importer(&self) -> anyhow::Result<Importer> {
        let codec = RowCodec::new(self.config.codec.date_format.clone())
            .context("invalid codec.date_format")?;
        Ok(Importer::new(codec))
    }

    pub fn exporter(&self) -> anyhow::Result<Exporter> {
        Exporter::from_config(&self.config).context("failed to build exporter")
    }

    pub fn sources(&self) -> anyhow::Result<SourceRegistry> {
        SourceRegistry::with_defaults(&self.config.import)
            .context("failed to build import sources")
    }
}
