//! Batch image conversion.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::converter::{
    ConversionFailure, ConversionReport, ConversionStats, ConverterError, FileOutcome,
    ImageConfig, ImageEncoder, ProgressEvent, RasterEncoder,
};

use super::files;
use super::report;
use super::scheduler;
use super::stats;

/// File extensions accepted as image input.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Drives bounded-concurrency image conversion over a folder or an
/// explicit file selection.
///
/// Converters are stateless aside from their configuration; construct
/// one per run or share it freely.
pub struct ImageBatchConverter {
    encoder: Arc<dyn ImageEncoder>,
    config: ImageConfig,
}

impl ImageBatchConverter {
    /// Creates a converter with the given encoder and configuration.
    pub fn new(encoder: Arc<dyn ImageEncoder>, config: ImageConfig) -> Self {
        Self { encoder, config }
    }

    /// Creates a converter with the library-backed encoder.
    pub fn with_default_encoder(config: ImageConfig) -> Self {
        Self::new(Arc::new(RasterEncoder::new()), config)
    }

    /// Converts the working set of `input_dir` into `output_dir`.
    ///
    /// The working set is `selected` when non-empty, otherwise every
    /// file in `input_dir` with a supported extension. An empty working
    /// set fails before the output directory is created. Individual
    /// file failures are collected in the report and never abort the
    /// run.
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
            files::list_media_files(input_dir, IMAGE_EXTENSIONS)?
        } else {
            selected.to_vec()
        };

        if files.is_empty() {
            return Err(ConverterError::NoFilesFound {
                media: "image",
                path: input_dir.to_path_buf(),
            });
        }

        files::ensure_output_dir(output_dir).await?;

        let batch_size = scheduler::resolve_concurrency(concurrency);
        let total = files.len();
        info!(
            total,
            batch_size,
            format = ?self.config.format,
            quality = self.config.quality,
            "Starting image batch conversion"
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
            "Image batch conversion finished"
        );
        Ok(result)
    }
}

/// Converts a single file, folding any error into a `Failure` outcome.
#[allow(clippy::too_many_arguments)]
async fn convert_one(
    encoder: Arc<dyn ImageEncoder>,
    config: ImageConfig,
    input_dir: PathBuf,
    output_dir: PathBuf,
    file: String,
    index: usize,
    total: usize,
    progress: Option<mpsc::Sender<ProgressEvent>>,
) -> FileOutcome {
    report(&progress, ProgressEvent::converting(index + 1, total, &file)).await;

    match encode_one(encoder, config, &input_dir, &output_dir, &file).await {
        Ok(stats) => {
            report(&progress, ProgressEvent::completed(index + 1, total, &file)).await;
            FileOutcome::Success(stats)
        }
        Err(e) => {
            let error = e.to_string();
            warn!(file = %file, error = %error, "Image conversion failed");
            report(
                &progress,
                ProgressEvent::failed(index + 1, total, &file, &error),
            )
            .await;
            FileOutcome::Failure(ConversionFailure { file, error })
        }
    }
}

async fn encode_one(
    encoder: Arc<dyn ImageEncoder>,
    config: ImageConfig,
    input_dir: &Path,
    output_dir: &Path,
    file: &str,
) -> Result<ConversionStats, ConverterError> {
    let input_path = input_dir.join(file);
    let output_name = files::output_file_name(file, config.format.extension());
    let output_path = output_dir.join(output_name);

    // The codec call is CPU-bound and atomic; run it off the async runtime.
    let task_input = input_path.clone();
    let task_output = output_path.clone();
    tokio::task::spawn_blocking(move || encoder.encode(&task_input, &task_output, &config))
        .await
        .map_err(|e| {
            ConverterError::encode_failed(format!("Encoder task panicked: {}", e), None)
        })??;

    stats::file_stats(&input_path, &output_path).await
}
