//! Segmentation service boundary
//!
//! Background removal itself is an opaque external capability: encoded image
//! bytes go in, encoded image bytes with a transparent background come out.
//! The [`Segmenter`] trait keeps that boundary swappable so the pipeline can
//! run against an HTTP-hosted model, a passthrough, or a test double.

use crate::error::{PipelineError, Result};
use std::time::Duration;
use tracing::debug;

/// Default request timeout for the HTTP segmentation client
pub const DEFAULT_SEGMENTATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Capability interface for background segmentation
///
/// Implementations receive the raw encoded bytes of a subject image and
/// return encoded bytes of the same image with background pixels made
/// transparent or near-transparent. The container format of the result only
/// needs to be decodable by a standard image codec.
pub trait Segmenter: Send + Sync {
    /// Remove the background from one encoded image
    ///
    /// # Errors
    /// [`PipelineError::Segmentation`] when the service call fails; the batch
    /// driver records this per file and continues.
    fn segment(&self, image_bytes: &[u8]) -> Result<Vec<u8>>;
}

impl<F> Segmenter for F
where
    F: Fn(&[u8]) -> Result<Vec<u8>> + Send + Sync,
{
    fn segment(&self, image_bytes: &[u8]) -> Result<Vec<u8>> {
        self(image_bytes)
    }
}

/// Segmenter that returns its input unchanged
///
/// Useful for flatten-only runs (compositing images that already carry
/// transparency) and as a stand-in when no segmentation service is
/// configured.
pub struct PassthroughSegmenter;

impl Segmenter for PassthroughSegmenter {
    fn segment(&self, image_bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(image_bytes.to_vec())
    }
}

/// Client for an HTTP-hosted segmentation service
///
/// POSTs the raw image bytes to the configured endpoint and returns the
/// response body. Works against rembg-style services that accept an encoded
/// image and respond with a transparent-background PNG.
pub struct HttpSegmenter {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpSegmenter {
    /// Create a client with the default timeout
    pub fn new<S: Into<String>>(endpoint: S) -> Result<Self> {
        Self::with_timeout(endpoint, DEFAULT_SEGMENTATION_TIMEOUT)
    }

    /// Create a client with an explicit request timeout
    pub fn with_timeout<S: Into<String>>(endpoint: S, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                PipelineError::segmentation(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    /// The endpoint this client posts to
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Segmenter for HttpSegmenter {
    fn segment(&self, image_bytes: &[u8]) -> Result<Vec<u8>> {
        debug!(
            "posting {} byte(s) to segmentation service at {}",
            image_bytes.len(),
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image_bytes.to_vec())
            .send()
            .map_err(|e| {
                PipelineError::segmentation(format!("request to {} failed: {e}", self.endpoint))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::segmentation(format!(
                "{} returned {status}",
                self.endpoint
            )));
        }

        let body = response.bytes().map_err(|e| {
            PipelineError::segmentation(format!(
                "failed to read response from {}: {e}",
                self.endpoint
            ))
        })?;
        debug!("segmentation service returned {} byte(s)", body.len());
        Ok(body.to_vec())
    }
}
