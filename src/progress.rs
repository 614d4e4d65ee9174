//! Progress UI (percentage bar) for scrape runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use affdir_core::JobController;
use indicatif::{ProgressBar, ProgressStyle};

/// Spawns the progress UI when requested.
/// Returns (handle, stop) so the caller can signal stop and await the handle.
/// When `use_bar` is false, returns (None, stop) with stop already true.
pub(crate) fn spawn_progress_ui(
    use_bar: bool,
    controller: Arc<JobController>,
) -> (Option<tokio::task::JoinHandle<()>>, Arc<AtomicBool>) {
    if !use_bar {
        return (None, Arc::new(AtomicBool::new(true)));
    }
    let stop = Arc::new(AtomicBool::new(false));
    let handle = spawn_bar_inner(controller, Arc::clone(&stop));
    (Some(handle), stop)
}

fn spawn_bar_inner(
    controller: Arc<JobController>,
    stop: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {pos}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        while !stop.load(Ordering::SeqCst) {
            let percent = controller.progress();
            bar.set_position(u64::from(percent));
            let (done, total) = controller
                .job()
                .map_or((0, 0), |job| (job.done(), job.total()));
            bar.set_message(format!("[{done}/{total}] pages"));
            if percent >= 100 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(120)).await;
        }

        bar.finish_and_clear();
    })
}
