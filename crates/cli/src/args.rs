//! Command-line argument definitions.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use mediapress_core::QualityTier;

#[derive(Debug, Parser)]
#[command(
    name = "mediapress",
    version,
    about = "Batch-convert images and videos to web-friendly formats"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert images to WebP or AVIF
    Images(ImageArgs),
    /// Convert videos to WebM or MP4
    Videos(VideoArgs),
}

#[derive(Debug, Args)]
pub struct CommonArgs {
    /// Input folder to read from
    pub input: PathBuf,

    /// Output folder for converted files
    #[arg(short, long)]
    pub output: PathBuf,

    /// Explicit files to convert (names relative to the input folder);
    /// all supported files in the input folder when omitted
    #[arg(short, long)]
    pub files: Vec<String>,

    /// Concurrent conversions: a number, or maximum/balanced/light
    #[arg(short, long, value_parser = ConcurrencyLevel::parse)]
    pub concurrency: Option<ConcurrencyLevel>,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the final report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ImageArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Quality tier shortcut (overridden by explicit flags)
    #[arg(long, value_enum)]
    pub tier: Option<TierArg>,

    /// Output format: webp or avif
    #[arg(long)]
    pub format: Option<String>,

    /// Encoding quality, 0-100
    #[arg(short, long)]
    pub quality: Option<u8>,

    /// Lossless encoding
    #[arg(long)]
    pub lossless: bool,
}

#[derive(Debug, Args)]
pub struct VideoArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Quality tier shortcut (overridden by explicit flags)
    #[arg(long, value_enum)]
    pub tier: Option<TierArg>,

    /// Output container: webm or mp4
    #[arg(long)]
    pub container: Option<String>,

    /// Constant Rate Factor, 0-51
    #[arg(long)]
    pub crf: Option<u8>,

    /// Encoder speed preset (ultrafast .. veryslow)
    #[arg(long)]
    pub preset: Option<String>,

    /// Video codec: vp9, h264, h265, h264_nvenc, h264_amf
    #[arg(long)]
    pub codec: Option<String>,

    /// Target video bitrate (e.g. 2M)
    #[arg(long)]
    pub bitrate: Option<String>,

    /// Output resolution as WIDTHxHEIGHT
    #[arg(long)]
    pub resolution: Option<String>,

    /// Output frame rate
    #[arg(long)]
    pub fps: Option<f32>,

    /// Audio codec passed to ffmpeg
    #[arg(long)]
    pub audio_codec: Option<String>,

    /// Audio bitrate passed to ffmpeg
    #[arg(long)]
    pub audio_bitrate: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TierArg {
    High,
    Medium,
    Low,
}

impl From<TierArg> for QualityTier {
    fn from(tier: TierArg) -> Self {
        match tier {
            TierArg::High => QualityTier::High,
            TierArg::Medium => QualityTier::Medium,
            TierArg::Low => QualityTier::Low,
        }
    }
}

/// Requested concurrency: an exact count or a qualitative level mapped
/// to the host's core count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyLevel {
    Maximum,
    Balanced,
    Light,
    Fixed(usize),
}

impl ConcurrencyLevel {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_ascii_lowercase().as_str() {
            "maximum" | "max" => Ok(Self::Maximum),
            "balanced" => Ok(Self::Balanced),
            "light" => Ok(Self::Light),
            other => match other.parse::<usize>() {
                Ok(n) if n >= 1 => Ok(Self::Fixed(n)),
                Ok(_) => Err("concurrency must be at least 1".to_string()),
                Err(_) => Err(format!(
                    "expected a number or maximum/balanced/light, got '{}'",
                    other
                )),
            },
        }
    }

    /// Maps the level to a batch size for this host.
    pub fn resolve(&self) -> usize {
        let cores = num_cpus::get().max(1);
        match self {
            Self::Maximum => cores,
            Self::Balanced => (cores / 2).max(1),
            Self::Light => 2.min(cores),
            Self::Fixed(n) => *n,
        }
    }
}
