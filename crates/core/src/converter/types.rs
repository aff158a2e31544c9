//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use super::error::ConverterError;

/// Output format for image conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    /// WebP (lossy or lossless)
    Webp,
    /// AVIF (AV1 still image)
    Avif,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Avif => "avif",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = ConverterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "webp" => Ok(Self::Webp),
            "avif" => Ok(Self::Avif),
            other => Err(ConverterError::invalid_config(format!(
                "Unsupported image format: {}",
                other
            ))),
        }
    }
}

/// Video codec for the output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoCodec {
    /// VP9 (libvpx)
    Vp9,
    /// H.264 / AVC (libx264)
    H264,
    /// H.265 / HEVC (libx265)
    H265,
    /// H.264 via NVIDIA NVENC
    H264Nvenc,
    /// H.264 via AMD AMF
    H264Amf,
}

impl VideoCodec {
    /// Returns the ffmpeg encoder name for this codec.
    pub fn ffmpeg_encoder(&self) -> &'static str {
        match self {
            Self::Vp9 => "libvpx-vp9",
            Self::H264 => "libx264",
            Self::H265 => "libx265",
            Self::H264Nvenc => "h264_nvenc",
            Self::H264Amf => "h264_amf",
        }
    }

    /// Whether this codec runs on a hardware encoder.
    pub fn is_hardware(&self) -> bool {
        matches!(self, Self::H264Nvenc | Self::H264Amf)
    }
}

impl FromStr for VideoCodec {
    type Err = ConverterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "libvpx-vp9" | "vp9" => Ok(Self::Vp9),
            "libx264" | "h264" => Ok(Self::H264),
            "libx265" | "h265" => Ok(Self::H265),
            "h264_nvenc" => Ok(Self::H264Nvenc),
            "h264_amf" => Ok(Self::H264Amf),
            other => Err(ConverterError::invalid_config(format!(
                "Unsupported video codec: {}",
                other
            ))),
        }
    }
}

/// Container format for video output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerFormat {
    /// WebM
    Webm,
    /// MPEG-4 Part 14 (.mp4)
    Mp4,
}

impl ContainerFormat {
    /// Returns the file extension for this container.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Webm => "webm",
            Self::Mp4 => "mp4",
        }
    }

    /// The software codec used when no hardware encoder applies.
    pub fn cpu_codec(&self) -> VideoCodec {
        match self {
            Self::Webm => VideoCodec::Vp9,
            Self::Mp4 => VideoCodec::H264,
        }
    }
}

impl FromStr for ContainerFormat {
    type Err = ConverterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "webm" => Ok(Self::Webm),
            "mp4" => Ok(Self::Mp4),
            other => Err(ConverterError::invalid_config(format!(
                "Unsupported video format: {}",
                other
            ))),
        }
    }
}

/// Encoder speed preset (the x264/x265 ladder, also honored by libvpx).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoPreset {
    Ultrafast,
    Superfast,
    Veryfast,
    Faster,
    Fast,
    Medium,
    Slow,
    Slower,
    Veryslow,
}

impl VideoPreset {
    /// Returns the preset name as passed to ffmpeg.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ultrafast => "ultrafast",
            Self::Superfast => "superfast",
            Self::Veryfast => "veryfast",
            Self::Faster => "faster",
            Self::Fast => "fast",
            Self::Medium => "medium",
            Self::Slow => "slow",
            Self::Slower => "slower",
            Self::Veryslow => "veryslow",
        }
    }
}

impl FromStr for VideoPreset {
    type Err = ConverterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ultrafast" => Ok(Self::Ultrafast),
            "superfast" => Ok(Self::Superfast),
            "veryfast" => Ok(Self::Veryfast),
            "faster" => Ok(Self::Faster),
            "fast" => Ok(Self::Fast),
            "medium" => Ok(Self::Medium),
            "slow" => Ok(Self::Slow),
            "slower" => Ok(Self::Slower),
            "veryslow" => Ok(Self::Veryslow),
            other => Err(ConverterError::invalid_config(format!(
                "Invalid video preset: {}",
                other
            ))),
        }
    }
}

/// Named quality tiers offered by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    High,
    Medium,
    Low,
}

/// Configuration for image conversion.
///
/// Validated at construction; an out-of-range quality never reaches a
/// conversion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Encoding quality, 0-100.
    #[serde(default = "default_image_quality")]
    pub quality: u8,
    /// Target output format.
    #[serde(default = "default_image_format")]
    pub format: ImageFormat,
    /// Lossless encoding (quality is ignored by WebP when set).
    #[serde(default)]
    pub lossless: bool,
}

fn default_image_quality() -> u8 {
    80
}

fn default_image_format() -> ImageFormat {
    ImageFormat::Webp
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            quality: default_image_quality(),
            format: default_image_format(),
            lossless: false,
        }
    }
}

impl ImageConfig {
    /// Creates a validated image configuration.
    pub fn new(quality: u8, format: ImageFormat) -> Result<Self, ConverterError> {
        let config = Self {
            quality,
            format,
            lossless: false,
        };
        config.validate()?;
        Ok(config)
    }

    /// Quality tier defaults: 90/80/60, WebP.
    pub fn from_tier(tier: QualityTier) -> Self {
        let quality = match tier {
            QualityTier::High => 90,
            QualityTier::Medium => 80,
            QualityTier::Low => 60,
        };
        Self {
            quality,
            ..Default::default()
        }
    }

    /// Validates field ranges. Invalid configuration is a pre-flight
    /// error, never a per-file failure.
    pub fn validate(&self) -> Result<(), ConverterError> {
        if self.quality > 100 {
            return Err(ConverterError::invalid_config(
                "Image quality must be between 0 and 100",
            ));
        }
        Ok(())
    }
}

/// Configuration for video conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Constant Rate Factor, 0-51 (lower is better quality).
    #[serde(default = "default_crf")]
    pub crf: u8,
    /// Encoder speed preset.
    #[serde(default = "default_preset")]
    pub preset: VideoPreset,
    /// Video codec.
    #[serde(default = "default_codec")]
    pub codec: VideoCodec,
    /// Output container.
    #[serde(default = "default_container")]
    pub container: ContainerFormat,
    /// Target video bitrate (e.g. "2M"); CRF-only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<String>,
    /// Output resolution as WIDTHxHEIGHT (e.g. "1280x720"); source
    /// resolution is kept when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// Output frame rate; source rate is kept when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f32>,
    /// Audio codec passed to ffmpeg.
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,
    /// Audio bitrate passed to ffmpeg.
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
}

fn default_crf() -> u8 {
    28
}

fn default_preset() -> VideoPreset {
    VideoPreset::Medium
}

fn default_codec() -> VideoCodec {
    VideoCodec::Vp9
}

fn default_container() -> ContainerFormat {
    ContainerFormat::Webm
}

fn default_audio_codec() -> String {
    "libopus".to_string()
}

fn default_audio_bitrate() -> String {
    "128k".to_string()
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            crf: default_crf(),
            preset: default_preset(),
            codec: default_codec(),
            container: default_container(),
            bitrate: None,
            resolution: None,
            fps: None,
            audio_codec: default_audio_codec(),
            audio_bitrate: default_audio_bitrate(),
        }
    }
}

impl VideoConfig {
    /// Creates a validated video configuration.
    pub fn new(
        crf: u8,
        preset: VideoPreset,
        codec: VideoCodec,
        container: ContainerFormat,
    ) -> Result<Self, ConverterError> {
        let config = Self {
            crf,
            preset,
            codec,
            container,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Quality tier defaults: CRF 23/28/35 with slow/medium/fast, VP9 WebM.
    pub fn from_tier(tier: QualityTier) -> Self {
        let (crf, preset) = match tier {
            QualityTier::High => (23, VideoPreset::Slow),
            QualityTier::Medium => (28, VideoPreset::Medium),
            QualityTier::Low => (35, VideoPreset::Fast),
        };
        Self {
            crf,
            preset,
            ..Default::default()
        }
    }

    /// Validates field ranges. Invalid configuration is a pre-flight
    /// error, never a per-file failure.
    pub fn validate(&self) -> Result<(), ConverterError> {
        if self.crf > 51 {
            return Err(ConverterError::invalid_config(
                "Video CRF must be between 0 and 51",
            ));
        }
        if self.audio_bitrate.is_empty() {
            return Err(ConverterError::invalid_config(
                "Audio bitrate cannot be empty",
            ));
        }
        Ok(())
    }
}

/// Lifecycle state reported for a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Converting,
    Completed,
    Failed,
}

/// Progress update emitted during a batch run.
///
/// A file produces one or more `Converting` events followed by exactly
/// one `Completed` or `Failed`. Only video conversions carry a
/// fractional `percent`; image encoding is a single atomic call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// 1-based position of the file in the run.
    pub current: usize,
    /// Total number of files in the run.
    pub total: usize,
    /// File name being converted.
    pub file: String,
    /// Lifecycle state.
    pub status: ProgressStatus,
    /// Fractional progress (0-100), video only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<f32>,
    /// Error message, present on `Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressEvent {
    /// A conversion has started (or is still running, when `percent` follows).
    pub fn converting(current: usize, total: usize, file: &str) -> Self {
        Self {
            current,
            total,
            file: file.to_string(),
            status: ProgressStatus::Converting,
            percent: None,
            error: None,
        }
    }

    /// A running video conversion reporting fractional progress.
    pub fn converting_percent(current: usize, total: usize, file: &str, percent: f32) -> Self {
        Self {
            percent: Some(percent),
            ..Self::converting(current, total, file)
        }
    }

    /// A conversion finished successfully.
    pub fn completed(current: usize, total: usize, file: &str) -> Self {
        Self {
            status: ProgressStatus::Completed,
            ..Self::converting(current, total, file)
        }
    }

    /// A conversion failed.
    pub fn failed(current: usize, total: usize, file: &str, error: &str) -> Self {
        Self {
            status: ProgressStatus::Failed,
            error: Some(error.to_string()),
            ..Self::converting(current, total, file)
        }
    }
}

/// Size statistics for one successfully converted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Input file name.
    pub input: String,
    /// Output file name.
    pub output: String,
    /// Human-readable input size.
    pub input_size: String,
    /// Human-readable output size.
    pub output_size: String,
    /// Size reduction percentage, one decimal (e.g. "60.0").
    pub reduction: String,
}

/// A single failed conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionFailure {
    /// The file as it was requested.
    pub file: String,
    /// Captured error message.
    pub error: String,
}

/// Terminal outcome of one file's conversion attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileOutcome {
    Success(ConversionStats),
    Failure(ConversionFailure),
}

impl FileOutcome {
    /// Whether this outcome is a success.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Aggregated result of a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionReport {
    /// Successful conversions, in scheduler output order.
    pub successes: Vec<ConversionStats>,
    /// Failed conversions, in scheduler output order.
    pub failures: Vec<ConversionFailure>,
}

impl ConversionReport {
    /// Partitions outcomes by tag, preserving relative order within
    /// each group.
    pub fn from_outcomes(outcomes: Vec<FileOutcome>) -> Self {
        let mut report = Self::default();
        for outcome in outcomes {
            match outcome {
                FileOutcome::Success(stats) => report.successes.push(stats),
                FileOutcome::Failure(failure) => report.failures.push(failure),
            }
        }
        report
    }

    /// Total number of files the run attempted.
    pub fn total(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    /// Whether any file failed.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Information about a media file, as reported by ffprobe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// File path.
    pub path: PathBuf,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Container format (e.g. "mov", "matroska").
    pub format: String,
    /// Video codec (if present).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
    /// Video width (if present).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_width: Option<u32>,
    /// Video height (if present).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_height: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_format_extension() {
        assert_eq!(ImageFormat::Webp.extension(), "webp");
        assert_eq!(ImageFormat::Avif.extension(), "avif");
    }

    #[test]
    fn test_image_format_parse() {
        assert_eq!("webp".parse::<ImageFormat>().unwrap(), ImageFormat::Webp);
        assert_eq!("AVIF".parse::<ImageFormat>().unwrap(), ImageFormat::Avif);
        assert!("gif".parse::<ImageFormat>().is_err());
    }

    #[test]
    fn test_video_codec_encoder_names() {
        assert_eq!(VideoCodec::Vp9.ffmpeg_encoder(), "libvpx-vp9");
        assert_eq!(VideoCodec::H264.ffmpeg_encoder(), "libx264");
        assert_eq!(VideoCodec::H264Nvenc.ffmpeg_encoder(), "h264_nvenc");
    }

    #[test]
    fn test_video_codec_parse() {
        assert_eq!(
            "libvpx-vp9".parse::<VideoCodec>().unwrap(),
            VideoCodec::Vp9
        );
        assert_eq!("h264_amf".parse::<VideoCodec>().unwrap(), VideoCodec::H264Amf);
        assert!("mpeg2".parse::<VideoCodec>().is_err());
    }

    #[test]
    fn test_container_cpu_codec() {
        assert_eq!(ContainerFormat::Webm.cpu_codec(), VideoCodec::Vp9);
        assert_eq!(ContainerFormat::Mp4.cpu_codec(), VideoCodec::H264);
    }

    #[test]
    fn test_preset_parse_rejects_unknown() {
        assert_eq!(
            "veryslow".parse::<VideoPreset>().unwrap(),
            VideoPreset::Veryslow
        );
        assert!("turbo".parse::<VideoPreset>().is_err());
    }

    #[test]
    fn test_image_config_validation() {
        assert!(ImageConfig::new(80, ImageFormat::Webp).is_ok());
        assert!(ImageConfig::new(0, ImageFormat::Avif).is_ok());
        assert!(ImageConfig::new(100, ImageFormat::Webp).is_ok());

        let result = ImageConfig::new(150, ImageFormat::Webp);
        assert!(result.is_err());
    }

    #[test]
    fn test_video_config_validation() {
        assert!(VideoConfig::new(
            0,
            VideoPreset::Medium,
            VideoCodec::Vp9,
            ContainerFormat::Webm
        )
        .is_ok());
        assert!(VideoConfig::new(
            51,
            VideoPreset::Fast,
            VideoCodec::H264,
            ContainerFormat::Mp4
        )
        .is_ok());

        let result = VideoConfig::new(
            52,
            VideoPreset::Medium,
            VideoCodec::Vp9,
            ContainerFormat::Webm,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_image_tiers() {
        assert_eq!(ImageConfig::from_tier(QualityTier::High).quality, 90);
        assert_eq!(ImageConfig::from_tier(QualityTier::Medium).quality, 80);
        assert_eq!(ImageConfig::from_tier(QualityTier::Low).quality, 60);
    }

    #[test]
    fn test_video_tiers() {
        let high = VideoConfig::from_tier(QualityTier::High);
        assert_eq!(high.crf, 23);
        assert_eq!(high.preset, VideoPreset::Slow);

        let low = VideoConfig::from_tier(QualityTier::Low);
        assert_eq!(low.crf, 35);
        assert_eq!(low.preset, VideoPreset::Fast);
    }

    #[test]
    fn test_report_partitions_in_order() {
        let outcomes = vec![
            FileOutcome::Success(ConversionStats {
                input: "a.png".into(),
                output: "a.webp".into(),
                input_size: "1 KB".into(),
                output_size: "400 Bytes".into(),
                reduction: "60.9".into(),
            }),
            FileOutcome::Failure(ConversionFailure {
                file: "b.png".into(),
                error: "boom".into(),
            }),
            FileOutcome::Success(ConversionStats {
                input: "c.png".into(),
                output: "c.webp".into(),
                input_size: "2 KB".into(),
                output_size: "1 KB".into(),
                reduction: "50.0".into(),
            }),
        ];

        let report = ConversionReport::from_outcomes(outcomes);
        assert_eq!(report.total(), 3);
        assert_eq!(report.successes.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.successes[0].input, "a.png");
        assert_eq!(report.successes[1].input, "c.png");
        assert_eq!(report.failures[0].file, "b.png");
        assert!(report.has_failures());
    }

    #[test]
    fn test_progress_event_constructors() {
        let event = ProgressEvent::converting(1, 10, "clip.mp4");
        assert_eq!(event.status, ProgressStatus::Converting);
        assert!(event.percent.is_none());

        let event = ProgressEvent::converting_percent(1, 10, "clip.mp4", 42.5);
        assert_eq!(event.percent, Some(42.5));

        let event = ProgressEvent::failed(2, 10, "clip.mp4", "no such file");
        assert_eq!(event.status, ProgressStatus::Failed);
        assert_eq!(event.error.as_deref(), Some("no such file"));
    }
}
