//! Error types for the compositing pipeline

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Error taxonomy for batch compositing operations
///
/// Two variants are batch-fatal (`MissingInputDirectory`, `OutputUncreatable`);
/// everything else is scoped to a single file and is recorded in the batch
/// summary instead of aborting the run. See [`PipelineError::is_fatal`].
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The input directory does not exist or is not a directory
    #[error("input directory does not exist: {path}")]
    MissingInputDirectory {
        /// Path that was checked
        path: PathBuf,
    },

    /// The output directory could not be created (permissions, read-only fs, ...)
    #[error("failed to create output directory '{path}': {source}")]
    OutputUncreatable {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A single input file could not be read
    #[error("failed to read '{path}': {source}")]
    FileRead {
        /// File that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A composited result could not be written to the output directory
    #[error("failed to write '{path}': {source}")]
    FileWrite {
        /// Destination that could not be written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The segmentation service rejected or failed a request
    #[error("segmentation failed: {0}")]
    Segmentation(String),

    /// The subject bytes are not a decodable image
    #[error("failed to decode subject image: {0}")]
    Decode(#[source] image::ImageError),

    /// The composited image could not be encoded
    #[error("failed to encode composited image: {0}")]
    Encode(String),

    /// Invalid configuration or parameters
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineError {
    /// Create a new segmentation error
    pub fn segmentation<S: Into<String>>(msg: S) -> Self {
        Self::Segmentation(msg.into())
    }

    /// Create a new encode error
    pub fn encode<S: Into<String>>(msg: S) -> Self {
        Self::Encode(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a file read error with path context
    pub fn file_read<P: AsRef<Path>>(path: P, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a file write error with path context
    pub fn file_write<P: AsRef<Path>>(path: P, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Whether this error aborts a whole batch run
    ///
    /// Fatal errors surface to the caller with no partial summary; non-fatal
    /// errors are caught at the per-file boundary and the batch continues.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingInputDirectory { .. }
                | Self::OutputUncreatable { .. }
                | Self::InvalidConfig(_)
        )
    }
}
