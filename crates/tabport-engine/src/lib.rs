//! # tabport-engine
//!
//! Import and export orchestration on top of `tabport-db`.
//!
//! - [`source`]: pluggable import sources (CSV built in)
//! - [`import`]: [`Importer`], one transaction per run, per-row messages
//! - [`export`]: [`Exporter`], tagged document plus output transforms
//! - [`jobs`]: [`JobRunner`], keyed background jobs on tokio's blocking pool
//! - [`maintenance`]: stored exports, folder import sweep, export cleanup

pub mod error;
pub mod export;
pub mod import;
pub mod jobs;
pub mod maintenance;
pub mod source;

pub use error::{EngineError, SourceError};
pub use export::{ExportDocument, Exporter, Transform, TransformRegistry};
pub use import::{ImportOptions, Importer};
pub use jobs::{ExportJobs, ExportRequest, ImportJobs, JobRunner};
pub use source::{ImportSource, ImportSourceFactory, SourceRegistry};
