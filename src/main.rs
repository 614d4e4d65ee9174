//! CLI entry point for the affdir tool.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use affdir_core::{HttpFetcher, JobController, PageFetcher};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

mod cli;
mod progress;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?cli, "CLI arguments parsed");

    match cli.command {
        Command::Run {
            affnos,
            output,
            workers,
            base_url,
            no_progress,
        } => {
            run_scrape(
                &affnos,
                &output,
                usize::from(workers),
                base_url,
                no_progress || cli.quiet,
            )
            .await
        }
        Command::Serve {
            port,
            workers,
            base_url,
        } => {
            let controller = build_controller(usize::from(workers), base_url)?;
            let addr = SocketAddr::from(([127, 0, 0, 1], port));
            affdir_core::server::serve(controller, addr)
                .await
                .context("HTTP surface failed")
        }
    }
}

fn build_controller(workers: usize, base_url: Option<String>) -> Result<Arc<JobController>> {
    let fetcher: Arc<dyn PageFetcher> = match base_url {
        Some(url) => Arc::new(HttpFetcher::with_base_url(url)),
        None => Arc::new(HttpFetcher::new()),
    };
    Ok(Arc::new(JobController::with_workers(fetcher, workers)?))
}

async fn run_scrape(
    affnos: &str,
    output: &str,
    workers: usize,
    base_url: Option<String>,
    quiet: bool,
) -> Result<()> {
    let controller = build_controller(workers, base_url)?;

    let started = controller.start(affnos, output)?;
    info!(
        scheduled = started.scheduled,
        skipped = started.skipped.len(),
        workers,
        "scrape job started"
    );

    let (bar_handle, stop) = progress::spawn_progress_ui(!quiet, Arc::clone(&controller));

    controller.wait().await;

    stop.store(true, Ordering::SeqCst);
    if let Some(handle) = bar_handle {
        let _ = handle.await;
    }

    let job = started.job;
    let csv = controller
        .export_csv()
        .context("every page fetch failed; nothing to export")?;
    std::fs::write(&started.filename, csv)
        .with_context(|| format!("failed to write {}", started.filename))?;

    info!(
        path = %started.filename,
        records = job.records_len(),
        failed = job.failed(),
        "export written"
    );

    Ok(())
}
