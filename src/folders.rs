//! Input/output folder resolution
//!
//! Validates the input directory and prepares the output directory before a
//! batch run. Both failure modes here are batch-fatal; no files are processed
//! if resolution fails.

use crate::error::{PipelineError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate the input directory and create the output directory
///
/// The output directory is created together with any missing parents; calling
/// this again with an existing directory is a no-op. The input directory must
/// already exist and be a directory.
///
/// Returns both paths absolutized for unambiguous logging.
///
/// # Errors
/// * [`PipelineError::OutputUncreatable`] if the output directory cannot be created
/// * [`PipelineError::MissingInputDirectory`] if the input directory is absent
pub fn resolve_folders(input_dir: &Path, output_dir: &Path) -> Result<(PathBuf, PathBuf)> {
    let input = absolutize(input_dir);
    let output = absolutize(output_dir);

    debug!("resolving input directory: {}", input.display());
    debug!("resolving output directory: {}", output.display());

    std::fs::create_dir_all(&output).map_err(|source| PipelineError::OutputUncreatable {
        path: output.clone(),
        source,
    })?;

    if !input.is_dir() {
        return Err(PipelineError::MissingInputDirectory { path: input });
    }

    Ok((input, output))
}

/// Resolve a path against the current working directory without touching disk
fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}
