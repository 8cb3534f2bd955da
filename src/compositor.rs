//! Subject-over-backdrop compositing
//!
//! Takes the segmentation service's output (an image whose background pixels
//! are transparent or near-transparent), blends it per pixel onto an opaque
//! solid-color backdrop of identical dimensions, and encodes the result. The
//! blend uses the full continuous alpha channel; anti-aliased edges are
//! blended proportionally, never thresholded to a binary cutout.

use crate::config::{BackdropColor, OutputFormat};
use crate::error::{PipelineError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbImage};
use tracing::debug;

/// Decode subject bytes, composite over a solid backdrop, and encode
///
/// This is the whole per-file compositing step: any decodable container goes
/// in, fully opaque encoded bytes of identical pixel dimensions come out.
/// Either step fully succeeds or an error is returned; no partial output.
///
/// # Errors
/// * [`PipelineError::Decode`] if `subject_bytes` is not a decodable image
/// * [`PipelineError::Encode`] if the blended result cannot be encoded
pub fn composite(
    subject_bytes: &[u8],
    backdrop: BackdropColor,
    format: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>> {
    let subject = decode_subject(subject_bytes)?;
    let blended = blend_over_backdrop(&subject, backdrop);
    encode_image(&blended, format, quality)
}

/// Decode raw bytes into an image, logging its pixel-format mode
pub fn decode_subject(subject_bytes: &[u8]) -> Result<DynamicImage> {
    let subject = image::load_from_memory(subject_bytes).map_err(PipelineError::Decode)?;
    debug!(
        "decoded subject: mode={:?}, size={}x{}",
        subject.color(),
        subject.width(),
        subject.height()
    );
    Ok(subject)
}

/// Blend a subject onto an opaque backdrop of identical dimensions
///
/// If the subject's pixel-format mode carries an alpha channel (RGBA and
/// grayscale-alpha; palette transparency is expanded by the decoder), that
/// channel is the per-pixel opacity mask:
/// `out = subject * a/255 + backdrop * (1 - a/255)`. Subjects without alpha
/// are treated as fully opaque and pass through unchanged.
#[must_use]
pub fn blend_over_backdrop(subject: &DynamicImage, backdrop: BackdropColor) -> RgbImage {
    if !subject.color().has_alpha() {
        // All-opaque mask: the backdrop is invisible
        return subject.to_rgb8();
    }

    let rgba = subject.to_rgba8();
    let mut output = RgbImage::from_pixel(rgba.width(), rgba.height(), backdrop.to_rgb());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        *output.get_pixel_mut(x, y) = image::Rgb([
            blend_channel(r, backdrop.r, a),
            blend_channel(g, backdrop.g, a),
            blend_channel(b, backdrop.b, a),
        ]);
    }
    output
}

/// Encode an opaque RGB image into the requested container format
///
/// JPEG uses the configured quality; PNG and WebP are lossless here, so the
/// quality setting does not apply to them.
pub fn encode_image(image: &RgbImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
    let (width, height) = image.dimensions();
    let mut buffer = Vec::new();

    let result = match format {
        OutputFormat::Png => PngEncoder::new(&mut buffer).write_image(
            image.as_raw(),
            width,
            height,
            ExtendedColorType::Rgb8,
        ),
        OutputFormat::Jpeg => JpegEncoder::new_with_quality(&mut buffer, quality).write_image(
            image.as_raw(),
            width,
            height,
            ExtendedColorType::Rgb8,
        ),
        OutputFormat::WebP => WebPEncoder::new_lossless(&mut buffer).write_image(
            image.as_raw(),
            width,
            height,
            ExtendedColorType::Rgb8,
        ),
    };

    result.map_err(|e| PipelineError::encode(format!("{format} encoding failed: {e}")))?;
    Ok(buffer)
}

/// Weighted average of one channel: subject at `alpha`, backdrop at `255 - alpha`
fn blend_channel(subject: u8, backdrop: u8, alpha: u8) -> u8 {
    let a = u16::from(alpha);
    let weighted = u16::from(subject) * a + u16::from(backdrop) * (255 - a);
    // +127 rounds to nearest instead of truncating
    ((weighted + 127) / 255) as u8
}
