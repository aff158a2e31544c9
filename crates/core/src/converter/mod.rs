//! Single-file encode primitives and their contracts.
//!
//! This module defines the vocabulary of a conversion (formats, codecs,
//! per-media configuration, progress events, outcomes) and the encoder
//! seams the batch engine drives:
//!
//! - [`ImageEncoder`] with the library-backed [`RasterEncoder`]
//!   (WebP via libwebp, AVIF via the `image` crate)
//! - [`VideoEncoder`] with the process-backed [`FfmpegEncoder`]
//!   (ffmpeg with parsed `-progress` output)
//!
//! Configuration is validated before any conversion starts; invalid
//! quality/CRF is a pre-flight error, never a per-file failure.

mod capabilities;
mod config;
mod error;
mod ffmpeg;
mod raster;
mod traits;
mod types;

pub use capabilities::EncoderCapabilities;
pub use config::EncoderConfig;
pub use error::ConverterError;
pub use ffmpeg::FfmpegEncoder;
pub use raster::RasterEncoder;
pub use traits::{ImageEncoder, VideoEncoder};
pub use types::{
    ContainerFormat, ConversionFailure, ConversionReport, ConversionStats, FileOutcome,
    ImageConfig, ImageFormat, MediaInfo, ProgressEvent, ProgressStatus, QualityTier, VideoCodec,
    VideoConfig, VideoPreset,
};
