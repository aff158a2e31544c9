//! Core library for mediapress: a bounded-concurrency batch converter
//! that turns local images and videos into web-friendly formats.
//!
//! The [`batch`] module is the engine: it resolves a working file set,
//! drives per-file conversions in fixed-size concurrent batches, and
//! aggregates successes and failures without aborting on individual
//! errors. The [`converter`] module holds the single-file encode
//! primitives (library-backed for images, ffmpeg-backed for videos)
//! and the configuration/progress/outcome vocabulary shared with
//! callers.

pub mod batch;
pub mod config;
pub mod converter;
pub mod testing;

pub use batch::{
    file_stats, format_bytes, list_media_files, output_file_name, resolve_concurrency,
    run_in_batches, ImageBatchConverter, VideoBatchConverter, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS,
};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use converter::{
    ContainerFormat, ConversionFailure, ConversionReport, ConversionStats, ConverterError,
    EncoderCapabilities, EncoderConfig, FfmpegEncoder, FileOutcome, ImageConfig, ImageEncoder,
    ImageFormat, MediaInfo, ProgressEvent, ProgressStatus, QualityTier, RasterEncoder, VideoCodec,
    VideoConfig, VideoEncoder, VideoPreset,
};
