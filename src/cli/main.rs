//! Batch compositing CLI
//!
//! Parses arguments, initializes tracing once, and drives one batch run over
//! the given input and output directories.

use crate::batch::{BatchProcessor, BatchSummary};
use crate::config::{BackdropColor, BatchConfig};
use crate::error::PipelineError;
use crate::progress::{LogReporter, ProgressReporter};
use crate::segmenter::{HttpSegmenter, PassthroughSegmenter, Segmenter};
use crate::tracing_config::TracingConfig;
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Batch background removal and solid-backdrop compositing
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "blackdrop")]
pub struct Cli {
    /// Directory containing the source images
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Directory the composited images are written to (created if absent)
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// URL of the background-segmentation service; omit to only flatten
    /// transparency the inputs already carry
    #[arg(short, long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Request timeout for the segmentation service, in seconds
    #[arg(long, default_value_t = 60, value_name = "SECONDS")]
    pub timeout: u64,

    /// File extension to process (repeatable) [default: png, jpg, jpeg, webp]
    #[arg(long = "extension", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Backdrop color as an RRGGBB hex triple
    #[arg(long, default_value = "000000", value_name = "RRGGBB")]
    pub backdrop: String,

    /// Quality for lossy output encoders (95-100)
    #[arg(long, default_value_t = 95)]
    pub quality: u8,

    /// Print the final summary as JSON on stdout
    #[arg(long)]
    pub json_summary: bool,

    /// Disable the progress bar (log lines only)
    #[arg(long)]
    pub no_progress: bool,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

pub fn main() -> Result<()> {
    let cli = Cli::parse();

    TracingConfig::new()
        .with_verbosity(cli.verbose)
        .init()
        .context("Failed to initialize tracing")?;

    let backdrop =
        BackdropColor::from_hex(&cli.backdrop).context("Invalid --backdrop value")?;

    let mut builder = BatchConfig::builder()
        .input_dir(&cli.input_dir)
        .output_dir(&cli.output_dir)
        .backdrop(backdrop)
        .quality(cli.quality);
    if !cli.extensions.is_empty() {
        builder = builder.allowed_extensions(&cli.extensions);
    }
    let config = builder.build().context("Invalid batch configuration")?;

    let segmenter: Box<dyn Segmenter> = match &cli.endpoint {
        Some(url) => {
            info!("Using segmentation service at {url}");
            Box::new(
                HttpSegmenter::with_timeout(url, Duration::from_secs(cli.timeout))
                    .context("Failed to build segmentation client")?,
            )
        },
        None => {
            warn!("No --endpoint given; flattening existing transparency only");
            Box::new(PassthroughSegmenter)
        },
    };

    let reporter: Box<dyn ProgressReporter> = if cli.no_progress {
        Box::new(LogReporter)
    } else {
        Box::new(BarReporter::new())
    };

    let summary = BatchProcessor::new(config, segmenter)
        .with_reporter(reporter)
        .run()
        .context("Batch run failed")?;

    for failure in &summary.failed {
        warn!("failed: {} ({})", failure.file_name, failure.reason);
    }
    info!(
        "Summary: attempted {}, succeeded {}, failed {}",
        summary.attempted,
        summary.succeeded,
        summary.failed.len()
    );

    if cli.json_summary {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}

/// Progress reporter backed by an indicatif terminal bar
struct BarReporter {
    bar: ProgressBar,
}

impl BarReporter {
    fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl ProgressReporter for BarReporter {
    fn batch_started(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap()
                .progress_chars("#>-"),
        );
        self.bar.set_draw_target(ProgressDrawTarget::stderr());
    }

    fn file_started(&self, name: &str, _index: usize, _total: usize) {
        self.bar.set_message(format!("processing {name}"));
    }

    fn file_succeeded(&self, _name: &str, _processed: usize, _total: usize) {
        self.bar.inc(1);
    }

    fn file_failed(&self, name: &str, error: &PipelineError, _processed: usize, _total: usize) {
        self.bar.println(format!("failed {name}: {error}"));
        self.bar.inc(1);
    }

    fn batch_finished(&self, summary: &BatchSummary) {
        self.bar.finish_with_message(format!(
            "Completed! Succeeded: {}, Failed: {}",
            summary.succeeded,
            summary.failed.len()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_minimal() {
        let cli = Cli::parse_from(["blackdrop", "in", "out"]);
        assert_eq!(cli.input_dir, PathBuf::from("in"));
        assert_eq!(cli.output_dir, PathBuf::from("out"));
        assert!(cli.endpoint.is_none());
        assert_eq!(cli.quality, 95);
        assert_eq!(cli.backdrop, "000000");
        assert!(!cli.json_summary);
    }

    #[test]
    fn test_cli_parsing_full() {
        let cli = Cli::parse_from([
            "blackdrop",
            "in",
            "out",
            "--endpoint",
            "http://localhost:7000/api/remove",
            "--extension",
            "png",
            "--extension",
            "webp",
            "--backdrop",
            "ff00ff",
            "--quality",
            "98",
            "--timeout",
            "30",
            "--json-summary",
            "-vv",
        ]);
        assert_eq!(
            cli.endpoint.as_deref(),
            Some("http://localhost:7000/api/remove")
        );
        assert_eq!(cli.extensions, vec!["png", "webp"]);
        assert_eq!(cli.backdrop, "ff00ff");
        assert_eq!(cli.quality, 98);
        assert_eq!(cli.timeout, 30);
        assert!(cli.json_summary);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_bar_reporter_handles_full_sequence() {
        let reporter = BarReporter::new();
        reporter.batch_started(2);
        reporter.file_started("a.png", 0, 2);
        reporter.file_succeeded("a.png", 1, 2);
        reporter.file_started("b.png", 1, 2);
        reporter.file_failed(
            "b.png",
            &PipelineError::segmentation("service down"),
            2,
            2,
        );
        reporter.batch_finished(&BatchSummary {
            attempted: 2,
            succeeded: 1,
            failed: vec![],
        });
    }
}
