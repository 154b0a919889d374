//! The traversal-and-dispatch loop and its supporting types.
//!
//! A run is:
//! 1. discover every candidate under the root (fatal on failure)
//! 2. for each candidate, in order: derive the output path, skip it if it
//!    already exists, remux into a partial file, publish it
//! 3. report "N of M" after every candidate
//!
//! Per-file failures never stop the run; they are collected in the
//! `RunSummary` and can be written out as a JSON report.

mod dispatcher;
mod errors;
mod output;
mod progress;
mod report;
mod types;

pub use dispatcher::{ProgressCallback, Runner};
pub use errors::{RunError, RunResult};
pub use output::{output_path, partial_path};
pub use progress::{CancelHandle, Progress};
pub use report::write_report;
pub use types::{FileOutcome, FileReport, RunOptions, RunSummary, SkipReason};
