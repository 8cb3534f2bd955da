#![allow(clippy::missing_errors_doc)]
#![allow(clippy::uninlined_format_args)]

//! # blackdrop
//!
//! Batch image normalization: remove each image's background through an
//! external segmentation service, composite the extracted subject onto a
//! solid backdrop (pure black by default), and write fully opaque results to
//! an output folder — continuing past per-file failures and reporting
//! aggregate progress.
//!
//! ## Features
//!
//! - **Per-file failure isolation**: one broken file never aborts the batch;
//!   failures are collected into the final [`BatchSummary`]
//! - **True alpha compositing**: anti-aliased edges are blended with the
//!   continuous opacity mask, never thresholded to a hard cutout
//! - **Swappable segmentation**: the model is an opaque capability behind the
//!   [`Segmenter`] trait (HTTP-hosted service, passthrough, or test double)
//! - **Atomic outputs**: a file in the output folder always means compositing
//!   fully succeeded; failed files leave nothing behind
//! - **CLI integration**: optional command-line interface (enable with the
//!   `cli` feature)
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use blackdrop::{BackdropColor, BatchConfig, BatchProcessor, HttpSegmenter};
//!
//! # fn example() -> blackdrop::Result<()> {
//! let config = BatchConfig::builder()
//!     .input_dir("photos")
//!     .output_dir("photos/done")
//!     .backdrop(BackdropColor::BLACK)
//!     .build()?;
//!
//! let segmenter = HttpSegmenter::new("http://localhost:7000/api/remove")?;
//! let summary = BatchProcessor::new(config, Box::new(segmenter)).run()?;
//!
//! println!(
//!     "{} of {} images composited; failures: {:?}",
//!     summary.succeeded,
//!     summary.attempted,
//!     summary.failed_file_names()
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Library vs CLI usage
//!
//! All pipeline functionality is available by default as a library; the `cli`
//! feature adds the command-line frontend. To use only as a library:
//!
//! ```toml
//! [dependencies]
//! blackdrop = { version = "0.1", default-features = false }
//! ```

pub mod batch;
#[cfg(feature = "cli")]
pub mod cli;
pub mod compositor;
pub mod config;
pub mod error;
pub mod folders;
pub mod progress;
pub mod segmenter;
#[cfg(feature = "cli")]
pub mod tracing_config;

// Public API exports
pub use batch::{run_batch, BatchProcessor, BatchSummary, FileFailure};
pub use compositor::{blend_over_backdrop, composite, decode_subject, encode_image};
pub use config::{
    BackdropColor, BatchConfig, BatchConfigBuilder, OutputFormat, DEFAULT_EXTENSIONS,
    DEFAULT_QUALITY,
};
pub use error::{PipelineError, Result};
pub use folders::resolve_folders;
pub use progress::{LogReporter, NoOpReporter, ProgressReporter};
pub use segmenter::{
    HttpSegmenter, PassthroughSegmenter, Segmenter, DEFAULT_SEGMENTATION_TIMEOUT,
};

#[cfg(feature = "cli")]
pub use tracing_config::TracingConfig;

/// Composite a single image's bytes over a backdrop, returning encoded bytes
///
/// Stream-friendly entry point for callers that already hold segmented image
/// bytes in memory (an upload handler, for example) and only need the
/// flattening step.
///
/// # Examples
/// ```rust,no_run
/// use blackdrop::{composite_bytes, BackdropColor, OutputFormat};
///
/// # fn example(upload: Vec<u8>) -> blackdrop::Result<()> {
/// let opaque = composite_bytes(&upload, BackdropColor::BLACK, OutputFormat::Png)?;
/// # Ok(())
/// # }
/// ```
pub fn composite_bytes(
    subject_bytes: &[u8],
    backdrop: BackdropColor,
    format: OutputFormat,
) -> Result<Vec<u8>> {
    compositor::composite(subject_bytes, backdrop, format, DEFAULT_QUALITY)
}
