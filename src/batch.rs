//! Batch driver
//!
//! Walks the input directory, runs segmentation and compositing per file, and
//! isolates failures at the per-file boundary: a broken file is recorded in
//! the summary and the run continues. Only folder resolution can abort a
//! whole batch.

use crate::compositor;
use crate::config::{BatchConfig, OutputFormat};
use crate::error::{PipelineError, Result};
use crate::folders::resolve_folders;
use crate::progress::{LogReporter, ProgressReporter};
use crate::segmenter::Segmenter;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// One per-file failure, with the offending filename and its cause
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    /// Filename (not full path) of the failed input
    pub file_name: String,
    /// Human-readable cause, from the per-file error
    pub reason: String,
}

/// Aggregate result of one batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    /// Files for which processing was attempted
    pub attempted: usize,
    /// Files composited and written successfully
    pub succeeded: usize,
    /// Per-file failures, in processing order
    pub failed: Vec<FileFailure>,
}

impl BatchSummary {
    /// Filenames of the failed inputs, for follow-up
    #[must_use]
    pub fn failed_file_names(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.file_name.as_str()).collect()
    }

    /// Whether every attempted file succeeded
    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty() && self.succeeded == self.attempted
    }
}

/// Sequential batch processor
///
/// Owns the run configuration and the segmentation capability. Files are
/// processed one at a time in lexicographic filename order; per-file state
/// never outlives the iteration that created it.
///
/// # Examples
/// ```rust,no_run
/// use blackdrop::{BatchConfig, BatchProcessor, PassthroughSegmenter};
///
/// # fn example() -> blackdrop::Result<()> {
/// let config = BatchConfig::new("photos", "photos/done");
/// let summary = BatchProcessor::new(config, Box::new(PassthroughSegmenter)).run()?;
/// println!("{} of {} succeeded", summary.succeeded, summary.attempted);
/// # Ok(())
/// # }
/// ```
pub struct BatchProcessor {
    config: BatchConfig,
    segmenter: Box<dyn Segmenter>,
    reporter: Box<dyn ProgressReporter>,
    stop_flag: Option<Arc<AtomicBool>>,
}

impl BatchProcessor {
    /// Create a processor with the default log-based progress reporter
    #[must_use]
    pub fn new(config: BatchConfig, segmenter: Box<dyn Segmenter>) -> Self {
        Self {
            config,
            segmenter,
            reporter: Box::new(LogReporter),
            stop_flag: None,
        }
    }

    /// Replace the progress reporter
    #[must_use]
    pub fn with_reporter(mut self, reporter: Box<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Install a cooperative stop flag, checked before each file
    ///
    /// When the flag becomes `true`, remaining files are skipped and the
    /// summary covers only the files attempted up to that point.
    #[must_use]
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }

    /// The run configuration
    #[must_use]
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Run the batch over the configured input directory
    ///
    /// # Errors
    /// Only batch-fatal conditions: [`PipelineError::MissingInputDirectory`],
    /// [`PipelineError::OutputUncreatable`], or a failure listing the input
    /// directory itself. Per-file failures are recorded in the summary and
    /// never returned as `Err`.
    pub fn run(&mut self) -> Result<BatchSummary> {
        info!(
            "starting batch: {} -> {}",
            self.config.input_dir.display(),
            self.config.output_dir.display()
        );
        let (input_dir, output_dir) =
            resolve_folders(&self.config.input_dir, &self.config.output_dir)?;

        let files = self.discover_files(&input_dir)?;
        let total = files.len();
        self.reporter.batch_started(total);

        let mut summary = BatchSummary::default();
        for (index, path) in files.iter().enumerate() {
            if let Some(flag) = &self.stop_flag {
                if flag.load(Ordering::Relaxed) {
                    warn!("stop requested; skipping {} remaining file(s)", total - index);
                    break;
                }
            }

            let name = file_name_of(path);
            self.reporter.file_started(&name, index, total);
            summary.attempted += 1;

            match self.process_file(path, &output_dir) {
                Ok(()) => {
                    summary.succeeded += 1;
                    self.reporter
                        .file_succeeded(&name, summary.attempted, total);
                },
                Err(e) => {
                    error!("failed to process {name}: {e}");
                    self.reporter
                        .file_failed(&name, &e, summary.attempted, total);
                    summary.failed.push(FileFailure {
                        file_name: name,
                        reason: e.to_string(),
                    });
                },
            }
        }

        info!(
            "batch complete: {}/{} succeeded, {} failed",
            summary.succeeded,
            summary.attempted,
            summary.failed.len()
        );
        self.reporter.batch_finished(&summary);
        Ok(summary)
    }

    /// List eligible files directly inside the input directory, sorted
    ///
    /// Non-recursive by design; subdirectories and ineligible extensions are
    /// skipped without being read. The lexicographic sort keeps the
    /// processing order stable within a run.
    fn discover_files(&self, input_dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(input_dir)
            .map_err(|e| PipelineError::file_read(input_dir, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PipelineError::file_read(input_dir, e))?;
            let path = entry.path();
            if path.is_file() && self.config.is_eligible(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Process one file end to end: read, segment, composite, write
    ///
    /// Every error here is per-file; the caller records it and moves on.
    fn process_file(&self, path: &Path, output_dir: &Path) -> Result<()> {
        let name = file_name_of(path);
        let bytes = std::fs::read(path).map_err(|e| PipelineError::file_read(path, e))?;

        let segmented = self.segmenter.segment(&bytes)?;

        let format = OutputFormat::from_path(path).ok_or_else(|| {
            PipelineError::encode(format!("no supported output encoding for '{name}'"))
        })?;
        let composited = compositor::composite(
            &segmented,
            self.config.backdrop,
            format,
            self.config.quality,
        )?;

        write_atomic(output_dir, &name, &composited)
    }
}

/// Run a batch with default configuration over two directories
///
/// Convenience wrapper around [`BatchProcessor`] using the default extension
/// set, black backdrop and encoder quality.
pub fn run_batch<P: AsRef<Path>, Q: AsRef<Path>>(
    input_dir: P,
    output_dir: Q,
    segmenter: Box<dyn Segmenter>,
) -> Result<BatchSummary> {
    let config = BatchConfig::new(
        input_dir.as_ref().to_path_buf(),
        output_dir.as_ref().to_path_buf(),
    );
    BatchProcessor::new(config, segmenter).run()
}

/// Write bytes under `file_name` in `dir` without ever exposing a partial file
///
/// Writes into a temp file in the same directory, then renames over the final
/// path. A failure at any point leaves no file under the final name.
fn write_atomic(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<()> {
    let final_path = dir.join(file_name);
    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| PipelineError::file_write(&final_path, e))?;
    temp.write_all(bytes)
        .map_err(|e| PipelineError::file_write(&final_path, e))?;
    temp.persist(&final_path)
        .map_err(|e| PipelineError::file_write(&final_path, e.error))?;
    Ok(())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
