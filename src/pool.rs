//! Bounded-concurrency scrape worker pool.
//!
//! The pool fans out over a list of affiliation numbers using a
//! semaphore to cap concurrent fetches. Each item is fetched and
//! extracted sequentially within its own task, and its outcome is
//! reported through the shared [`Job`] handle: a record on success, a
//! failure count otherwise. Items complete in whatever order their
//! fetches return.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::extract::extract_record;
use crate::fetch::PageFetcher;
use crate::job::Job;

/// Minimum allowed worker count.
const MIN_WORKERS: usize = 1;

/// Maximum allowed worker count.
const MAX_WORKERS: usize = 100;

/// Default worker count if not specified.
pub const DEFAULT_WORKERS: usize = 20;

/// Error type for pool construction.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Invalid worker count provided.
    #[error("invalid worker count {value}: must be between {MIN_WORKERS} and {MAX_WORKERS}")]
    InvalidWorkers {
        /// The invalid value that was provided.
        value: usize,
    },
}

/// Semaphore-bounded worker pool for fetch+extract items.
///
/// # Concurrency Model
///
/// - Each item runs in its own Tokio task
/// - A semaphore permit is acquired before spawning each task
/// - Permits are released automatically when tasks complete (RAII)
/// - Per-item atomicity: a record is either fully appended or not at all
///
/// Individual fetch failures are never fatal to the pool; they are
/// logged, counted on the job, and the item is excluded from results.
#[derive(Debug, Clone)]
pub struct ScrapePool {
    /// Semaphore for concurrency control.
    semaphore: Arc<Semaphore>,
    /// Configured worker count.
    workers: usize,
}

impl Default for ScrapePool {
    fn default() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(DEFAULT_WORKERS)),
            workers: DEFAULT_WORKERS,
        }
    }
}

impl ScrapePool {
    /// Creates a pool with the specified worker count (1-100).
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidWorkers`] if the value is outside the
    /// valid range.
    pub fn new(workers: usize) -> Result<Self, PoolError> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&workers) {
            return Err(PoolError::InvalidWorkers { value: workers });
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(workers)),
            workers,
        })
    }

    /// Returns the configured worker count.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Processes all affiliation numbers, reporting outcomes on `job`.
    ///
    /// Every submitted item produces exactly one outcome before this
    /// method returns: success appends a record and advances the done
    /// counter, failure advances the done and failed counters. When the
    /// job's cancellation flag is set, remaining items are accounted as
    /// failures without being fetched, so progress still reaches 100.
    #[instrument(skip(self, job, fetcher, affnos), fields(total = affnos.len(), workers = self.workers))]
    pub async fn run(&self, job: &Arc<Job>, fetcher: Arc<dyn PageFetcher>, affnos: Vec<u32>) {
        let mut handles = Vec::with_capacity(affnos.len());

        info!("starting scrape run");

        for affno in affnos {
            // Acquire semaphore permit (blocks while at the concurrency cap)
            let Ok(permit) = self.semaphore.clone().acquire_owned().await else {
                // The semaphore is never closed; account for the item anyway
                // so the job still completes.
                warn!(affno, "semaphore closed; counting item as failed");
                job.record_failure();
                continue;
            };

            let job = Arc::clone(job);
            let fetcher = Arc::clone(&fetcher);

            handles.push(tokio::spawn(async move {
                // Permit is dropped when this block exits (RAII)
                let _permit = permit;

                if job.is_cancelled() {
                    debug!(affno, "job cancelled; skipping item");
                    job.record_failure();
                    return;
                }

                match fetcher.fetch_page(affno).await {
                    Ok(body) => {
                        let record = extract_record(&body, affno);
                        job.record_success(record);
                        debug!(affno, progress = job.progress(), "item complete");
                    }
                    Err(e) => {
                        warn!(affno, error = %e, "fetch failed; item excluded from results");
                        job.record_failure();
                    }
                }
            }));
        }

        for handle in handles {
            if handle.await.is_err() {
                // A panicked task never reached its outcome; account for it
                // so the done counter still covers every submitted item.
                warn!("scrape task panicked; counting item as failed");
                job.record_failure();
            }
        }

        job.mark_finished();
        info!(
            done = job.done(),
            failed = job.failed(),
            records = job.records_len(),
            "scrape run complete"
        );
    }
}
