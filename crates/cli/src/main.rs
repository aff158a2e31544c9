mod args;
mod progress;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediapress_core::{
    load_config, validate_config, Config, ConversionReport, EncoderCapabilities, FfmpegEncoder,
    ImageBatchConverter, ImageConfig, VideoBatchConverter, VideoConfig, VideoEncoder,
};

use args::{Cli, Command, CommonArgs, ImageArgs, VideoArgs};

/// Buffer size for the progress event channel
const PROGRESS_BUFFER_SIZE: usize = 256;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Images(args) => run_images(args).await,
        Command::Videos(args) => run_videos(args).await,
    }
}

/// Loads the base configuration from --config, or starts from defaults.
fn load_base_config(common: &CommonArgs) -> Result<Config> {
    match &common.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            let config = load_config(path)
                .with_context(|| format!("Failed to load config from {:?}", path))?;
            Ok(config)
        }
        None => Ok(Config::default()),
    }
}

async fn run_images(args: ImageArgs) -> Result<()> {
    let mut config = load_base_config(&args.common)?;

    if let Some(tier) = args.tier {
        config.image = ImageConfig::from_tier(tier.into());
    }
    if let Some(quality) = args.quality {
        config.image.quality = quality;
    }
    if let Some(ref format) = args.format {
        config.image.format = format.parse()?;
    }
    if args.lossless {
        config.image.lossless = true;
    }

    validate_config(&config).context("Configuration validation failed")?;

    let converter = ImageBatchConverter::with_default_encoder(config.image.clone());
    let report = run_conversion(&converter, &args.common, &config).await?;
    progress::print_report(&report, args.common.json)
}

async fn run_videos(args: VideoArgs) -> Result<()> {
    let mut config = load_base_config(&args.common)?;

    if let Some(tier) = args.tier {
        config.video = VideoConfig::from_tier(tier.into());
    }
    if let Some(crf) = args.crf {
        config.video.crf = crf;
    }
    if let Some(ref preset) = args.preset {
        config.video.preset = preset.parse()?;
    }
    if let Some(ref codec) = args.codec {
        config.video.codec = codec.parse()?;
    }
    if let Some(ref container) = args.container {
        config.video.container = container.parse()?;
    }
    if let Some(ref bitrate) = args.bitrate {
        config.video.bitrate = Some(bitrate.clone());
    }
    if let Some(ref resolution) = args.resolution {
        config.video.resolution = Some(resolution.clone());
    }
    if let Some(fps) = args.fps {
        config.video.fps = Some(fps);
    }
    if let Some(ref audio_codec) = args.audio_codec {
        config.video.audio_codec = audio_codec.clone();
    }
    if let Some(ref audio_bitrate) = args.audio_bitrate {
        config.video.audio_bitrate = audio_bitrate.clone();
    }

    validate_config(&config).context("Configuration validation failed")?;

    // Downgrade hardware codec requests the host ffmpeg cannot serve.
    let capabilities = EncoderCapabilities::detect(&config.encoder).await;
    let resolved = capabilities.resolve_codec(config.video.codec, config.video.container);
    if resolved != config.video.codec {
        info!(
            requested = ?config.video.codec,
            resolved = ?resolved,
            "Hardware encoder unavailable, using software codec"
        );
    }
    config.video.codec = resolved;

    let encoder = FfmpegEncoder::new(config.encoder.clone());
    encoder
        .validate()
        .await
        .context("FFmpeg is not available")?;

    let converter = VideoBatchConverter::new(Arc::new(encoder), config.video.clone());
    let report = run_video_conversion(&converter, &args.common, &config).await?;
    progress::print_report(&report, args.common.json)
}

async fn run_conversion(
    converter: &ImageBatchConverter,
    common: &CommonArgs,
    config: &Config,
) -> Result<ConversionReport> {
    let (tx, rx) = mpsc::channel(PROGRESS_BUFFER_SIZE);
    let renderer = progress::spawn_renderer(rx);

    let report = converter
        .convert(
            &common.input,
            &common.output,
            &common.files,
            Some(tx),
            effective_concurrency(common, config),
        )
        .await?;

    let _ = renderer.await;
    Ok(report)
}

async fn run_video_conversion(
    converter: &VideoBatchConverter,
    common: &CommonArgs,
    config: &Config,
) -> Result<ConversionReport> {
    let (tx, rx) = mpsc::channel(PROGRESS_BUFFER_SIZE);
    let renderer = progress::spawn_renderer(rx);

    let report = converter
        .convert(
            &common.input,
            &common.output,
            &common.files,
            Some(tx),
            effective_concurrency(common, config),
        )
        .await?;

    let _ = renderer.await;
    Ok(report)
}

/// Command-line concurrency wins over the config file; `None` lets the
/// engine derive a batch size from the host.
fn effective_concurrency(common: &CommonArgs, config: &Config) -> Option<usize> {
    common
        .concurrency
        .map(|level| level.resolve())
        .or(config.batch.concurrency)
}
