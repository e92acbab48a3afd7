//! Background jobs keyed by a caller-chosen id.
//!
//! ```text
//! submit → queued → working → finished → take_result (unregistered)
//! ```
//!
//! Jobs run on tokio's blocking pool. The slot is inserted into the map
//! before the work is dispatched, so a reader never sees a key without a
//! status. A panicking job still finishes, without a result.

use dashmap::DashMap;
use duckdb::Connection;
use std::hash::Hash;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tabport_core::enums::JobStatus;
use tabport_core::result::ImportResult;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error::EngineError;
use crate::export::Exporter;
use crate::import::{ImportOptions, Importer};
use crate::source::ImportSource;

/// Status and eventual result of one job.
#[derive(Debug)]
pub struct JobSlot<T> {
    state: Mutex<(JobStatus, Option<T>)>,
}

impl<T> JobSlot<T> {
    const fn queued() -> Self {
        Self {
            state: Mutex::new((JobStatus::Queued, None)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, (JobStatus, Option<T>)> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn status(&self) -> JobStatus {
        self.lock().0
    }

    fn advance(&self, next: JobStatus, result: Option<T>) {
        let mut state = self.lock();
        match state.0.transition_to(next) {
            Ok(status) => state.0 = status,
            Err(error) => tracing::warn!(%error, "ignored job status change"),
        }
        if result.is_some() {
            state.1 = result;
        }
    }
}

/// Shared key → job map.
pub type JobMap<K, T> = Arc<DashMap<K, Arc<JobSlot<T>>>>;

/// Runs closures in the background and tracks them by key.
pub struct JobRunner<K, T> {
    jobs: JobMap<K, T>,
    handle: Handle,
}

impl<K, T> Clone for JobRunner<K, T> {
    fn clone(&self) -> Self {
        Self {
            jobs: Arc::clone(&self.jobs),
            handle: self.handle.clone(),
        }
    }
}

impl<K, T> JobRunner<K, T>
where
    K: Eq + Hash + Clone + std::fmt::Debug + Send + Sync + 'static,
    T: Send + 'static,
{
    /// Runner with its own job map, dispatching on `handle`.
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        Self::with_jobs(handle, Arc::new(DashMap::new()))
    }

    /// Runner sharing an existing job map.
    #[must_use]
    pub const fn with_jobs(handle: Handle, jobs: JobMap<K, T>) -> Self {
        Self { jobs, handle }
    }

    /// Runner on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoRuntime`] outside a runtime.
    pub fn from_current() -> Result<Self, EngineError> {
        Ok(Self::new(Handle::try_current()?))
    }

    /// Register `key` as queued and run `work` on the blocking pool.
    ///
    /// A job already registered under `key` is replaced; its result is lost.
    pub fn submit<F>(&self, key: K, work: F) -> JoinHandle<()>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let slot = Arc::new(JobSlot::queued());
        if self.jobs.insert(key.clone(), Arc::clone(&slot)).is_some() {
            tracing::warn!(?key, "job replaced an existing job with the same key");
        }
        tracing::debug!(?key, "job queued");

        self.handle.spawn_blocking(move || {
            slot.advance(JobStatus::Working, None);
            match catch_unwind(AssertUnwindSafe(work)) {
                Ok(result) => slot.advance(JobStatus::Finished, Some(result)),
                Err(_) => {
                    tracing::error!(?key, "job panicked");
                    slot.advance(JobStatus::Finished, None);
                }
            }
            tracing::debug!(?key, "job finished");
        })
    }

    /// Status of the job under `key`, if one is registered.
    #[must_use]
    pub fn status(&self, key: &K) -> Option<JobStatus> {
        self.jobs.get(key).map(|slot| slot.status())
    }

    /// Whether the job under `key` is queued or working.
    #[must_use]
    pub fn is_running(&self, key: &K) -> bool {
        self.status(key).is_some_and(JobStatus::is_in_progress)
    }

    /// Remove a finished job and return its result.
    ///
    /// Returns `None` while the job is in progress (it stays registered), for
    /// an unknown key, or for a job that panicked.
    pub fn take_result(&self, key: &K) -> Option<T> {
        let (_, slot) = self
            .jobs
            .remove_if(key, |_, slot| slot.status() == JobStatus::Finished)?;
        let mut state = slot.lock();
        state.1.take()
    }

    /// Number of registered jobs, finished ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Background imports, keyed by the caller.
pub type ImportJobs = JobRunner<String, ImportResult>;

/// Background exports. The result is the file-write outcome.
pub type ExportJobs = JobRunner<String, bool>;

impl ImportJobs {
    /// Import `source` into `table` on its own connection.
    pub fn submit_import(
        &self,
        key: String,
        mut conn: Connection,
        mut source: Box<dyn ImportSource + Send>,
        table: String,
        importer: Importer,
        options: ImportOptions,
    ) -> JoinHandle<()> {
        self.submit(key, move || {
            let result = importer.run(&mut conn, source.as_mut(), &table, options);
            source.close();
            result
        })
    }
}

/// What a background export reads and how it renders it.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub table: String,
    pub columns: Vec<String>,
    pub transform_id: String,
}

impl ExportJobs {
    /// Export into `<jobs_folder>/<key>/<table>.<extension>` on its own
    /// connection. Returns the target path with the job handle.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnsupportedFormat`] for an unknown transform;
    /// nothing is submitted then.
    pub fn submit_export(
        &self,
        key: String,
        conn: Connection,
        exporter: Arc<Exporter>,
        request: ExportRequest,
        jobs_folder: &Path,
    ) -> Result<(PathBuf, JoinHandle<()>), EngineError> {
        let extension = exporter
            .transforms()
            .get(&request.transform_id)
            .map(|transform| transform.extension().to_string())
            .ok_or_else(|| EngineError::UnsupportedFormat(request.transform_id.clone()))?;
        let path = jobs_folder
            .join(path_segment(&key)?)
            .join(format!("{}.{extension}", path_segment(&request.table)?));

        let target = path.clone();
        let handle = self.submit(key, move || {
            exporter.export_to_file(
                &target,
                &conn,
                &request.table,
                &request.columns,
                &request.transform_id,
            )
        });
        Ok((path, handle))
    }
}

/// Accepts `value` only when it names one entry directly inside a folder.
fn path_segment(value: &str) -> Result<&str, EngineError> {
    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !value.contains(['/', '\\']) => Ok(value),
        _ => Err(EngineError::InvalidPathSegment(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[tokio::test(flavor = "multi_thread")]
    async fn finished_job_yields_result_once() {
        let runner: JobRunner<String, u32> = JobRunner::from_current().unwrap();
        runner.submit("a".to_string(), || 42).await.unwrap();

        assert_eq!(runner.status(&"a".to_string()), Some(JobStatus::Finished));
        assert!(!runner.is_running(&"a".to_string()));
        assert_eq!(runner.take_result(&"a".to_string()), Some(42));
        assert_eq!(runner.take_result(&"a".to_string()), None);
        assert!(runner.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn running_job_is_not_taken() {
        let runner: JobRunner<&'static str, u32> = JobRunner::from_current().unwrap();
        let (release, gate) = mpsc::channel::<()>();
        let handle = runner.submit("slow", move || {
            gate.recv().ok();
            7
        });

        assert!(runner.is_running(&"slow"));
        assert_eq!(runner.take_result(&"slow"), None);
        assert_eq!(runner.len(), 1);

        release.send(()).unwrap();
        handle.await.unwrap();
        assert_eq!(runner.take_result(&"slow"), Some(7));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn panicking_job_still_finishes() {
        let runner: JobRunner<u8, u32> = JobRunner::from_current().unwrap();
        runner
            .submit(1, || panic!("job blew up"))
            .await
            .unwrap();
        assert_eq!(runner.status(&1), Some(JobStatus::Finished));
        assert_eq!(runner.take_result(&1), None);
        assert_eq!(runner.status(&1), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn shared_map_is_visible_to_clones() {
        let jobs: JobMap<u8, u8> = Arc::new(DashMap::new());
        let runner = JobRunner::with_jobs(Handle::current(), Arc::clone(&jobs));
        let other = runner.clone();
        runner.submit(3, || 9).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(other.take_result(&3), Some(9));
    }

    #[test]
    fn path_segment_refuses_anything_but_one_name() {
        assert_eq!(path_segment("user-7").unwrap(), "user-7");
        for bad in ["", ".", "..", "../x", "a/b", "a\\b", "/abs", "a/"] {
            assert!(
                matches!(path_segment(bad), Err(EngineError::InvalidPathSegment(_))),
                "{bad:?} accepted"
            );
        }
    }

    #[test]
    fn unknown_key_has_no_status() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let runner: JobRunner<u8, u8> = JobRunner::new(runtime.handle().clone());
        assert_eq!(runner.status(&0), None);
        assert!(!runner.is_running(&0));
    }
}
