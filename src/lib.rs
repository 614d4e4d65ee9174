//! Affdir Core Library
//!
//! This library provides the core functionality for the affdir tool,
//! which fetches per-school pages from the CBSE affiliation directory,
//! extracts and normalizes their tabular fields, and aggregates the
//! results into a fixed-schema CSV export.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`normalize`] - Canonical field value normalization
//! - [`extract`] - HTML table extraction into fixed-schema records
//! - [`fetch`] - Page fetch capability (trait + HTTP implementation)
//! - [`pool`] - Bounded-concurrency scrape worker pool
//! - [`job`] - Job lifecycle, progress, and result accumulation
//! - [`export`] - CSV export with canonical column order
//! - [`server`] - HTTP surface for submit / progress / download

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod export;
pub mod extract;
pub mod fetch;
pub mod input;
pub mod job;
pub mod normalize;
pub mod pool;
pub mod record;
pub mod server;

// Re-export commonly used types
pub use export::{ExportError, ensure_csv_filename, sanitize_download_filename, write_csv};
pub use extract::extract_record;
pub use fetch::{FETCH_TIMEOUT_SECS, FetchError, HttpFetcher, PageFetcher};
pub use input::{AffnoList, parse_affno_list};
pub use job::{Job, JobController, JobStarted, SubmitError};
pub use normalize::{FieldRole, normalize};
pub use pool::{DEFAULT_WORKERS, PoolError, ScrapePool};
pub use record::{COLUMN_COUNT, COLUMNS, SchoolRecord};
