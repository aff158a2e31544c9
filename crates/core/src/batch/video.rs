//! Batch video conversion.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::converter::{
    ConversionFailure, ConversionReport, ConversionStats, ConverterError, FileOutcome,
    ProgressEvent, VideoConfig, VideoEncoder,
};

use super::files;
use super::report;
use super::scheduler;
use super::stats;

/// File extensions accepted as video input.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv"];

/// Drives bounded-concurrency video conversion over a folder or an
/// explicit file selection.
pub struct VideoBatchConverter {
    encoder: Arc<dyn VideoEncoder>,
    config: VideoConfig,
}

impl VideoBatchConverter {
    /// Creates a converter with the given encoder and configuration.
    pub fn new(encoder: Arc<dyn VideoEncoder>, config: VideoConfig) -> Self {
        Self { encoder, config }
    }

    /// Converts the working set of `input_dir` into `output_dir`.
    ///
    /// Same contract as the image variant, with one addition: while a
    /// file is encoding, the progress sink receives `Converting` events
    /// carrying the fractional percentage reported by the encoder.
    pub async fn convert(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        selected: &[String],
        progress: Option<mpsc::Sender<ProgressEvent>>,
        concurrency: Option<usize>,
    ) -> Result<ConversionReport, ConverterError> {
        self.config.validate()?;

        let files = if selected.is_empty() {
            files::list_media_files(input_dir, VIDEO_EXTENSIONS)?
        } else {
            selected.to_vec()
        };

        if files.is_empty() {
            return Err(ConverterError::NoFilesFound {
                media: "video",
                path: input_dir.to_path_buf(),
            });
        }

        files::ensure_output_dir(output_dir).await?;

        let batch_size = scheduler::resolve_concurrency(concurrency);
        let total = files.len();
        info!(
            total,
            batch_size,
            codec = ?self.config.codec,
            crf = self.config.crf,
            container = ?self.config.container,
            "Starting video batch conversion"
        );

        let outcomes = scheduler::run_in_batches(&files, batch_size, |file, index| {
            let encoder = Arc::clone(&self.encoder);
            let config = self.config.clone();
            let input_dir = input_dir.to_path_buf();
            let output_dir = output_dir.to_path_buf();
            let progress = progress.clone();
            async move {
                convert_one(
                    encoder, config, input_dir, output_dir, file, index, total, progress,
                )
                .await
            }
        })
        .await;

        let result = ConversionReport::from_outcomes(outcomes);
        info!(
            succeeded = result.successes.len(),
            failed = result.failures.len(),
            "Video batch conversion finished"
        );
        Ok(result)
    }
}

/// Converts a single file, folding any error into a `Failure` outcome.
#[allow(clippy::too_many_arguments)]
async fn convert_one(
    encoder: Arc<dyn VideoEncoder>,
    config: VideoConfig,
    input_dir: PathBuf,
    output_dir: PathBuf,
    file: String,
    index: usize,
    total: usize,
    progress: Option<mpsc::Sender<ProgressEvent>>,
) -> FileOutcome {
    report(
        &progress,
        ProgressEvent::converting_percent(index + 1, total, &file, 0.0),
    )
    .await;

    match encode_one(
        encoder, config, &input_dir, &output_dir, &file, index, total, &progress,
    )
    .await
    {
        Ok(stats) => {
            report(&progress, ProgressEvent::completed(index + 1, total, &file)).await;
            FileOutcome::Success(stats)
        }
        Err(e) => {
            let error = e.to_string();
            warn!(file = %file, error = %error, "Video conversion failed");
            report(
                &progress,
                ProgressEvent::failed(index + 1, total, &file, &error),
            )
            .await;
            FileOutcome::Failure(ConversionFailure { file, error })
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn encode_one(
    encoder: Arc<dyn VideoEncoder>,
    config: VideoConfig,
    input_dir: &Path,
    output_dir: &Path,
    file: &str,
    index: usize,
    total: usize,
    progress: &Option<mpsc::Sender<ProgressEvent>>,
) -> Result<ConversionStats, ConverterError> {
    let input_path = input_dir.join(file);
    let output_name = files::output_file_name(file, config.container.extension());
    let output_path = output_dir.join(output_name);

    match progress {
        Some(sink) => {
            // Bridge the encoder's raw percentages into progress events.
            let (percent_tx, mut percent_rx) = mpsc::channel::<f32>(32);
            let sink = sink.clone();
            let file_name = file.to_string();
            let forwarder = tokio::spawn(async move {
                while let Some(percent) = percent_rx.recv().await {
                    let _ = sink.try_send(ProgressEvent::converting_percent(
                        index + 1,
                        total,
                        &file_name,
                        percent,
                    ));
                }
            });

            let result = encoder
                .encode_with_progress(&input_path, &output_path, &config, percent_tx)
                .await;
            // The sender is gone once the encode settles; wait for the
            // bridge to drain before emitting the terminal event.
            let _ = forwarder.await;
            result?;
        }
        None => {
            encoder.encode(&input_path, &output_path, &config).await?;
        }
    }

    stats::file_stats(&input_path, &output_path).await
}
