//! Progress reporting for batch runs
//!
//! Separates progress reporting from the batch driver so different frontends
//! (structured logs, a terminal progress bar, test capture) can plug in their
//! own handling. All methods default to no-ops; implement only what the
//! frontend cares about.

use crate::batch::BatchSummary;
use crate::error::PipelineError;
use tracing::{error, info};

/// Observer for the lifecycle of one batch run
///
/// The batch driver calls these in order: `batch_started` once, then for each
/// file `file_started` followed by exactly one of `file_succeeded` or
/// `file_failed`, then `batch_finished` once. `processed` counts files
/// attempted so far, including the one just finished.
pub trait ProgressReporter: Send + Sync {
    /// Called once after the eligible files have been discovered
    fn batch_started(&self, total: usize) {
        let _ = total;
    }

    /// Called before each file is processed
    fn file_started(&self, name: &str, index: usize, total: usize) {
        let _ = (name, index, total);
    }

    /// Called after a file completed compositing and was written
    fn file_succeeded(&self, name: &str, processed: usize, total: usize) {
        let _ = (name, processed, total);
    }

    /// Called after a file failed at any per-file stage
    fn file_failed(&self, name: &str, error: &PipelineError, processed: usize, total: usize) {
        let _ = (name, error, processed, total);
    }

    /// Called once with the final summary
    fn batch_finished(&self, summary: &BatchSummary) {
        let _ = summary;
    }
}

/// Reporter that discards all updates
pub struct NoOpReporter;

impl ProgressReporter for NoOpReporter {}

/// Reporter that emits one structured log line per event
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn batch_started(&self, total: usize) {
        info!("found {total} eligible file(s) to process");
    }

    fn file_started(&self, name: &str, index: usize, total: usize) {
        info!("processing {name} ({}/{total})", index + 1);
    }

    fn file_succeeded(&self, name: &str, processed: usize, total: usize) {
        info!("completed {name}; progress: {processed}/{total}");
    }

    fn file_failed(&self, name: &str, error: &PipelineError, processed: usize, total: usize) {
        error!("failed {name}: {error}; progress: {processed}/{total}");
    }

    fn batch_finished(&self, summary: &BatchSummary) {
        info!(
            "batch finished: {}/{} succeeded, {} failed",
            summary.succeeded,
            summary.attempted,
            summary.failed.len()
        );
    }
}
