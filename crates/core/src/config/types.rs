use serde::{Deserialize, Serialize};

use crate::converter::{EncoderConfig, ImageConfig, VideoConfig};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub video: VideoConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Batch engine configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BatchConfig {
    /// Number of concurrent conversions; derived from the host's core
    /// count when unset.
    #[serde(default)]
    pub concurrency: Option<usize>,
}
