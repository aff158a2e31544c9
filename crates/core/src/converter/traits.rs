//! Trait definitions for the encoder primitives.
//!
//! These are the seams between the batch engine and the actual
//! transcoding machinery. Image encoding is a single atomic library
//! call; video encoding is an external process that may report
//! fractional progress while it runs.

use async_trait::async_trait;
use std::path::Path;
use tokio::sync::mpsc;

use super::error::ConverterError;
use super::types::{ImageConfig, MediaInfo, VideoConfig};

/// A single-file image encoder.
///
/// `encode` is synchronous and CPU-bound; callers dispatch it through
/// `tokio::task::spawn_blocking`. It either writes `output` completely
/// or fails; there is no incremental progress.
pub trait ImageEncoder: Send + Sync {
    /// Returns the name of this encoder implementation.
    fn name(&self) -> &str;

    /// Converts `input` into `output` according to `config`.
    fn encode(
        &self,
        input: &Path,
        output: &Path,
        config: &ImageConfig,
    ) -> Result<(), ConverterError>;
}

/// A single-file video encoder.
#[async_trait]
pub trait VideoEncoder: Send + Sync {
    /// Returns the name of this encoder implementation.
    fn name(&self) -> &str;

    /// Probes a media file to get its information.
    async fn probe(&self, path: &Path) -> Result<MediaInfo, ConverterError>;

    /// Converts `input` into `output` according to `config`.
    async fn encode(
        &self,
        input: &Path,
        output: &Path,
        config: &VideoConfig,
    ) -> Result<(), ConverterError>;

    /// Converts with progress reporting.
    ///
    /// The sender receives completion percentages (0-100) while the
    /// encode runs. If the receiver is dropped, conversion continues
    /// without progress reporting.
    async fn encode_with_progress(
        &self,
        input: &Path,
        output: &Path,
        config: &VideoConfig,
        progress_tx: mpsc::Sender<f32>,
    ) -> Result<(), ConverterError>;

    /// Validates that the encoder is properly configured and ready.
    async fn validate(&self) -> Result<(), ConverterError>;
}
