//! Hardware encoder capability detection.

use serde::{Deserialize, Serialize};
use std::process::Stdio;
use tokio::process::Command;

use super::config::EncoderConfig;
use super::types::{ContainerFormat, VideoCodec};

/// Available hardware encoders detected on the system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncoderCapabilities {
    /// NVIDIA NVENC H.264 available
    pub h264_nvenc: bool,
    /// NVIDIA NVENC H.265/HEVC available
    pub hevc_nvenc: bool,
    /// Intel Quick Sync H.264 available
    pub h264_qsv: bool,
    /// AMD AMF H.264 available
    pub h264_amf: bool,
    /// VA-API H.264 available (Linux)
    pub h264_vaapi: bool,
}

impl EncoderCapabilities {
    /// Detect available hardware encoders by probing ffmpeg.
    pub async fn detect(config: &EncoderConfig) -> Self {
        let output = Command::new(&config.ffmpeg_path)
            .args(["-encoders"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await;

        let stdout = match output {
            Ok(o) if o.status.success() => String::from_utf8_lossy(&o.stdout).to_string(),
            _ => return Self::default(),
        };

        Self {
            h264_nvenc: stdout.contains("h264_nvenc"),
            hevc_nvenc: stdout.contains("hevc_nvenc"),
            h264_qsv: stdout.contains("h264_qsv"),
            h264_amf: stdout.contains("h264_amf"),
            h264_vaapi: stdout.contains("h264_vaapi"),
        }
    }

    /// Check if any hardware encoder is available.
    pub fn has_hardware_encoder(&self) -> bool {
        self.h264_nvenc || self.hevc_nvenc || self.h264_qsv || self.h264_amf || self.h264_vaapi
    }

    /// Resolves a requested codec against what the host supports.
    ///
    /// A hardware codec the host ffmpeg does not advertise falls back
    /// to the container's software codec; software codecs pass through.
    pub fn resolve_codec(&self, requested: VideoCodec, container: ContainerFormat) -> VideoCodec {
        match requested {
            VideoCodec::H264Nvenc if !self.h264_nvenc => container.cpu_codec(),
            VideoCodec::H264Amf if !self.h264_amf => container.cpu_codec(),
            other => other,
        }
    }
}
