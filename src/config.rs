//! Configuration types for batch compositing runs

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File extensions considered eligible when none are configured
pub const DEFAULT_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Default quality for lossy output encoders
///
/// Kept high so anti-aliased edge blending survives re-encoding.
pub const DEFAULT_QUALITY: u8 = 95;

/// Solid color the extracted subject is composited onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackdropColor {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl BackdropColor {
    /// Pure black, the default backdrop
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };

    /// Create a backdrop color from an RGB triple
    #[must_use]
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse an `RRGGBB` hex triple, with or without a leading `#`
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(PipelineError::invalid_config(format!(
                "backdrop color must be an RRGGBB hex triple, got '{hex}'"
            )));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| {
                PipelineError::invalid_config(format!("invalid hex digits in backdrop '{hex}'"))
            })
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// The color as an `image` crate RGB pixel
    #[must_use]
    pub fn to_rgb(self) -> image::Rgb<u8> {
        image::Rgb([self.r, self.g, self.b])
    }
}

impl Default for BackdropColor {
    fn default() -> Self {
        Self::BLACK
    }
}

impl std::fmt::Display for BackdropColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Output image encodings
///
/// The output format follows the source filename's extension, so an input
/// `photo.jpg` produces an opaque `photo.jpg` in the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// PNG (lossless)
    Png,
    /// JPEG (lossy, quality-controlled)
    Jpeg,
    /// WebP (lossless)
    WebP,
}

impl OutputFormat {
    /// Determine the output encoding from a filename's extension
    ///
    /// Returns `None` for extensions with no supported encoder.
    #[must_use]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Png => write!(f, "PNG"),
            Self::Jpeg => write!(f, "JPEG"),
            Self::WebP => write!(f, "WebP"),
        }
    }
}

/// Configuration for a batch compositing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Directory holding the source images
    pub input_dir: PathBuf,

    /// Directory the composited images are written to (created if absent)
    pub output_dir: PathBuf,

    /// Lowercased extensions (without dot) considered eligible
    pub allowed_extensions: Vec<String>,

    /// Backdrop the subject is composited onto
    pub backdrop: BackdropColor,

    /// Quality for lossy output encoders (95-100)
    pub quality: u8,
}

impl BatchConfig {
    /// Create a configuration with default extensions, backdrop and quality
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(input_dir: P, output_dir: Q) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect(),
            backdrop: BackdropColor::BLACK,
            quality: DEFAULT_QUALITY,
        }
    }

    /// Create a new configuration builder for fluent construction
    ///
    /// # Examples
    /// ```rust
    /// use blackdrop::{BackdropColor, BatchConfig};
    ///
    /// let config = BatchConfig::builder()
    ///     .input_dir("photos")
    ///     .output_dir("photos/done")
    ///     .backdrop(BackdropColor::new(0, 0, 0))
    ///     .quality(98)
    ///     .build()
    ///     .unwrap();
    /// ```
    #[must_use]
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder::default()
    }

    /// Whether a path's extension is in the allowed set (case-insensitive)
    #[must_use]
    pub fn is_eligible<P: AsRef<Path>>(&self, path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .is_some_and(|ext| self.allowed_extensions.iter().any(|allowed| *allowed == ext))
    }
}

/// Builder for [`BatchConfig`] with validation at build time
#[derive(Debug, Default)]
pub struct BatchConfigBuilder {
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    allowed_extensions: Option<Vec<String>>,
    backdrop: BackdropColor,
    quality: Option<u8>,
}

impl BatchConfigBuilder {
    /// Set the input directory
    #[must_use]
    pub fn input_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.input_dir = Some(dir.into());
        self
    }

    /// Set the output directory
    #[must_use]
    pub fn output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Replace the allowed extension set
    ///
    /// Extensions are normalized to lowercase and any leading dot is stripped,
    /// so `".PNG"` and `"png"` are equivalent.
    #[must_use]
    pub fn allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_extensions = Some(
            extensions
                .into_iter()
                .map(|ext| normalize_extension(ext.as_ref()))
                .collect(),
        );
        self
    }

    /// Set the backdrop color
    #[must_use]
    pub fn backdrop(mut self, backdrop: BackdropColor) -> Self {
        self.backdrop = backdrop;
        self
    }

    /// Set the lossy encoder quality (95-100)
    #[must_use]
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<BatchConfig> {
        let input_dir = self
            .input_dir
            .ok_or_else(|| PipelineError::invalid_config("input directory is required"))?;
        let output_dir = self
            .output_dir
            .ok_or_else(|| PipelineError::invalid_config("output directory is required"))?;

        let quality = self.quality.unwrap_or(DEFAULT_QUALITY);
        if !(DEFAULT_QUALITY..=100).contains(&quality) {
            return Err(PipelineError::invalid_config(format!(
                "quality must be between {DEFAULT_QUALITY} and 100, got {quality}"
            )));
        }

        let allowed_extensions = self
            .allowed_extensions
            .unwrap_or_else(|| DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect());
        if allowed_extensions.is_empty() {
            return Err(PipelineError::invalid_config(
                "at least one allowed extension is required",
            ));
        }

        Ok(BatchConfig {
            input_dir,
            output_dir,
            allowed_extensions,
            backdrop: self.backdrop,
            quality,
        })
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_lowercase()
}
