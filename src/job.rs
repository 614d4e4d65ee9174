//! Job lifecycle: the per-job state handle and the controller that owns it.
//!
//! Each call to [`JobController::start`] creates a fresh [`Job`] handle
//! and hands it to a background scrape task. A superseded job keeps
//! writing into its own handle, which the controller no longer reads,
//! so late writes are dropped explicitly instead of colliding with the
//! new job's state.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{info, warn};

use crate::export::{self, ExportError, ensure_csv_filename};
use crate::fetch::PageFetcher;
use crate::input::parse_affno_list;
use crate::pool::{PoolError, ScrapePool};
use crate::record::SchoolRecord;

/// Shared state for one scrape job.
///
/// Mutated only by the worker pool while the job runs; read-only once
/// [`is_finished`](Self::is_finished) turns true. Progress is
/// `floor(done / total * 100)` and is monotonically non-decreasing,
/// reaching exactly 100 once every submitted item has an outcome.
#[derive(Debug)]
pub struct Job {
    total: usize,
    done: AtomicUsize,
    failed: AtomicUsize,
    cancelled: AtomicBool,
    finished: AtomicBool,
    records: Mutex<Vec<SchoolRecord>>,
}

impl Job {
    /// Creates a job expecting `total` item outcomes. `total` must be
    /// non-zero; the controller only schedules non-empty lists.
    pub(crate) fn new(total: usize) -> Self {
        Self {
            total: total.max(1),
            done: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            cancelled: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            records: Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of submitted items.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Returns the number of items with a known outcome (success or failure).
    #[must_use]
    pub fn done(&self) -> usize {
        self.done.load(Ordering::SeqCst)
    }

    /// Returns the number of items excluded due to fetch failure.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Returns the completion percentage, 0-100 inclusive.
    #[must_use]
    pub fn progress(&self) -> u8 {
        let done = self.done().min(self.total);
        u8::try_from(done * 100 / self.total).unwrap_or(100)
    }

    /// Returns true once every submitted item has an outcome and the
    /// pool has handed the job back.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Requests early stop: workers account remaining items as failures
    /// without fetching them.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true if cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns the number of accumulated records.
    #[must_use]
    pub fn records_len(&self) -> usize {
        self.lock_records().len()
    }

    /// Returns a consistent snapshot of the accumulated records, in
    /// accumulation order.
    #[must_use]
    pub fn records_snapshot(&self) -> Vec<SchoolRecord> {
        self.lock_records().clone()
    }

    /// Appends a record and advances the completion counter. The append
    /// happens first so that 100% progress implies every record is
    /// visible to readers.
    pub(crate) fn record_success(&self, record: SchoolRecord) {
        self.lock_records().push(record);
        self.done.fetch_add(1, Ordering::SeqCst);
    }

    /// Counts a failed item and advances the completion counter.
    pub(crate) fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
        self.done.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn mark_finished(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }

    fn lock_records(&self) -> MutexGuard<'_, Vec<SchoolRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Error type for job submission.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The identifier list held no valid affiliation numbers.
    #[error("no valid affiliation numbers in input ({skipped} token(s) rejected)")]
    NoValidIdentifiers {
        /// Count of tokens rejected during parsing.
        skipped: usize,
    },
}

/// Outcome of an accepted job submission.
#[derive(Debug)]
pub struct JobStarted {
    /// Number of items scheduled.
    pub scheduled: usize,
    /// Tokens that were rejected during parsing.
    pub skipped: Vec<String>,
    /// Export filename (with `.csv` extension applied).
    pub filename: String,
    /// Handle for the started job.
    pub job: Arc<Job>,
}

struct CurrentJob {
    job: Arc<Job>,
    handle: Option<tokio::task::JoinHandle<()>>,
    filename: String,
}

/// Owns the current job's lifecycle: validates input, launches the
/// worker pool in the background, and exposes progress and export to
/// readers.
pub struct JobController {
    fetcher: Arc<dyn PageFetcher>,
    pool: ScrapePool,
    current: Mutex<Option<CurrentJob>>,
}

impl JobController {
    /// Creates a controller with the default worker count.
    #[must_use]
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            pool: ScrapePool::default(),
            current: Mutex::new(None),
        }
    }

    /// Creates a controller with an explicit worker count (1-100).
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidWorkers`] for an out-of-range count.
    pub fn with_workers(fetcher: Arc<dyn PageFetcher>, workers: usize) -> Result<Self, PoolError> {
        Ok(Self {
            fetcher,
            pool: ScrapePool::new(workers)?,
            current: Mutex::new(None),
        })
    }

    /// Validates the submitted identifier list and launches a new scrape
    /// job in the background, returning immediately.
    ///
    /// An in-flight previous job is cancelled and detached: it finishes
    /// draining into its own handle and its writes are never observed
    /// through this controller again.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::NoValidIdentifiers`] when, after trimming
    /// and filtering, no valid affiliation numbers remain.
    pub fn start(&self, raw_affnos: &str, filename: &str) -> Result<JobStarted, SubmitError> {
        let parsed = parse_affno_list(raw_affnos);
        for token in &parsed.skipped {
            warn!(%token, "skipping token that is not an affiliation number");
        }
        if parsed.is_empty() {
            return Err(SubmitError::NoValidIdentifiers {
                skipped: parsed.skipped.len(),
            });
        }

        let filename = ensure_csv_filename(filename);
        let job = Arc::new(Job::new(parsed.len()));
        info!(
            scheduled = parsed.len(),
            skipped = parsed.skipped.len(),
            filename = %filename,
            "starting scrape job"
        );

        // Cancel the previous job and install the fresh one under the
        // same lock, before the new pool task spawns, so readers never
        // observe the superseded job after an accepted start.
        let mut current = self.lock_current();
        if let Some(previous) = current.take() {
            if !previous.job.is_finished() {
                previous.job.cancel();
                info!("superseded an in-flight job; its remaining items are cancelled");
            }
        }

        let handle = {
            let pool = self.pool.clone();
            let fetcher = Arc::clone(&self.fetcher);
            let job = Arc::clone(&job);
            let affnos = parsed.affnos;
            tokio::spawn(async move {
                pool.run(&job, fetcher, affnos).await;
            })
        };

        *current = Some(CurrentJob {
            job: Arc::clone(&job),
            handle: Some(handle),
            filename: filename.clone(),
        });
        drop(current);

        Ok(JobStarted {
            scheduled: job.total(),
            skipped: parsed.skipped,
            filename,
            job,
        })
    }

    /// Returns the current job's completion percentage, or 0 when no job
    /// has been started. Safe to call at any time.
    #[must_use]
    pub fn progress(&self) -> u8 {
        self.lock_current().as_ref().map_or(0, |c| c.job.progress())
    }

    /// Returns true when the current job has accumulated any records.
    #[must_use]
    pub fn export_ready(&self) -> bool {
        self.lock_current()
            .as_ref()
            .is_some_and(|c| c.job.records_len() > 0)
    }

    /// Returns the export filename requested at submission, if any.
    #[must_use]
    pub fn export_filename(&self) -> Option<String> {
        self.lock_current().as_ref().map(|c| c.filename.clone())
    }

    /// Returns the current job handle, if any.
    #[must_use]
    pub fn job(&self) -> Option<Arc<Job>> {
        self.lock_current().as_ref().map(|c| Arc::clone(&c.job))
    }

    /// Requests cancellation of the current job. Remaining items are
    /// accounted as failures so the job still runs to a terminal state.
    pub fn cancel(&self) {
        if let Some(current) = self.lock_current().as_ref() {
            current.job.cancel();
        }
    }

    /// Awaits completion of the current job's background task. Returns
    /// immediately when no job is running or another caller already
    /// claimed the handle.
    pub async fn wait(&self) {
        let handle = self.lock_current().as_mut().and_then(|c| c.handle.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "scrape task failed to join");
            }
        }
    }

    /// Serializes the current job's records to CSV.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::NoRecords`] when nothing has been
    /// accumulated, and [`ExportError::Csv`] on serialization failure.
    pub fn export_csv(&self) -> Result<Vec<u8>, ExportError> {
        let records = self.job().map(|j| j.records_snapshot()).unwrap_or_default();
        export::write_csv(&records)
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<CurrentJob>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::*;
    use crate::fetch::FetchError;

    struct MapFetcher {
        pages: HashMap<u32, String>,
    }

    #[async_trait]
    impl PageFetcher for MapFetcher {
        async fn fetch_page(&self, affno: u32) -> Result<String, FetchError> {
            self.pages
                .get(&affno)
                .cloned()
                .ok_or_else(|| FetchError::http_status(affno, 404))
        }
    }

    fn fetcher_with(pages: &[(u32, &str)]) -> Arc<dyn PageFetcher> {
        let pages = pages
            .iter()
            .map(|(affno, name)| {
                (
                    *affno,
                    format!(
                        "<table><tr><td>Name of Institution</td><td>{name}</td></tr></table>"
                    ),
                )
            })
            .collect();
        Arc::new(MapFetcher { pages })
    }

    #[test]
    fn test_job_progress_floor() {
        let job = Job::new(3);
        assert_eq!(job.progress(), 0);
        job.record_failure();
        assert_eq!(job.progress(), 33);
        job.record_failure();
        assert_eq!(job.progress(), 66);
        job.record_failure();
        assert_eq!(job.progress(), 100);
    }

    #[test]
    fn test_job_progress_never_exceeds_100() {
        let job = Job::new(2);
        job.record_failure();
        job.record_failure();
        // A spurious extra outcome must not push progress past 100
        job.record_failure();
        assert_eq!(job.progress(), 100);
    }

    #[tokio::test]
    async fn test_start_rejects_empty_input() {
        let controller = JobController::new(fetcher_with(&[]));
        let result = controller.start("", "out");
        assert!(matches!(
            result,
            Err(SubmitError::NoValidIdentifiers { skipped: 0 })
        ));
        assert_eq!(controller.progress(), 0);
    }

    #[tokio::test]
    async fn test_start_rejects_all_garbage_input() {
        let controller = JobController::new(fetcher_with(&[]));
        let result = controller.start("abc, def", "out");
        assert!(matches!(
            result,
            Err(SubmitError::NoValidIdentifiers { skipped: 2 })
        ));
    }

    #[tokio::test]
    async fn test_start_runs_job_to_completion() {
        let controller =
            JobController::new(fetcher_with(&[(1, "Alpha School"), (2, "Beta School")]));
        let started = controller.start("1,2,3", "schools").unwrap();
        assert_eq!(started.scheduled, 3);
        assert_eq!(started.filename, "schools.csv");

        controller.wait().await;

        assert_eq!(controller.progress(), 100);
        let job = controller.job().unwrap();
        assert_eq!(job.records_len(), 2);
        assert_eq!(job.failed(), 1);
        assert!(controller.export_ready());
    }

    #[tokio::test]
    async fn test_second_start_resets_observable_state() {
        let controller = JobController::new(fetcher_with(&[(1, "Alpha"), (2, "Beta")]));
        controller.start("1,2", "first").unwrap();
        controller.wait().await;
        assert_eq!(controller.progress(), 100);

        let first_job = controller.job().unwrap();

        controller.start("1", "second").unwrap();
        let second_job = controller.job().unwrap();
        assert!(
            !Arc::ptr_eq(&first_job, &second_job),
            "each start must produce a fresh job handle"
        );
        assert_eq!(controller.export_filename().unwrap(), "second.csv");

        controller.wait().await;
        assert_eq!(second_job.records_len(), 1);
        // The superseded job's state is untouched by the new run
        assert_eq!(first_job.records_len(), 2);
    }

    #[tokio::test]
    async fn test_superseding_start_cancels_previous_before_returning() {
        /// Never resolves within the test's lifetime, so the first job
        /// is still in flight when the second one starts.
        struct StallFetcher;

        #[async_trait]
        impl PageFetcher for StallFetcher {
            async fn fetch_page(&self, affno: u32) -> Result<String, FetchError> {
                tokio::time::sleep(std::time::Duration::from_secs(60)).await;
                Err(FetchError::http_status(affno, 404))
            }
        }

        let controller = JobController::new(Arc::new(StallFetcher));
        let first = controller.start("1,2,3", "first").unwrap().job;

        controller.start("4", "second").unwrap();

        // By the time start returns, the old job is cancelled and no
        // reader can observe it through the controller.
        assert!(first.is_cancelled());
        let current = controller.job().unwrap();
        assert!(!Arc::ptr_eq(&first, &current));
        assert_eq!(controller.export_filename().unwrap(), "second.csv");
    }

    #[tokio::test]
    async fn test_export_without_job_is_error() {
        let controller = JobController::new(fetcher_with(&[]));
        assert!(matches!(
            controller.export_csv(),
            Err(ExportError::NoRecords)
        ));
        assert!(!controller.export_ready());
    }

    #[tokio::test]
    async fn test_export_all_failed_job_is_error() {
        let controller = JobController::new(fetcher_with(&[]));
        controller.start("1,2", "out").unwrap();
        controller.wait().await;
        assert_eq!(controller.progress(), 100);
        assert!(matches!(
            controller.export_csv(),
            Err(ExportError::NoRecords)
        ));
    }

    #[tokio::test]
    async fn test_cancel_without_job_is_noop() {
        let controller = JobController::new(fetcher_with(&[]));
        controller.cancel();
        assert_eq!(controller.progress(), 0);
    }
}
