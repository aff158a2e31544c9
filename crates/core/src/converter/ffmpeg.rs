//! FFmpeg-based video encoder implementation.

use async_trait::async_trait;
use regex_lite::Regex;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::EncoderConfig;
use super::error::ConverterError;
use super::traits::VideoEncoder;
use super::types::{ContainerFormat, MediaInfo, VideoCodec, VideoConfig};

/// Video encoder that shells out to ffmpeg.
pub struct FfmpegEncoder {
    config: EncoderConfig,
}

impl FfmpegEncoder {
    /// Creates a new FFmpeg encoder with the given configuration.
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Creates an encoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EncoderConfig::default())
    }

    /// Builds the ffmpeg argument vector for a conversion.
    fn build_args(&self, input: &Path, output: &Path, config: &VideoConfig) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(), // Overwrite output
            "-i".to_string(),
            input.to_string_lossy().to_string(),
        ];

        // Video codec and quality
        args.extend([
            "-c:v".to_string(),
            config.codec.ffmpeg_encoder().to_string(),
            "-crf".to_string(),
            config.crf.to_string(),
            "-preset".to_string(),
            config.preset.as_str().to_string(),
        ]);

        // Codec-specific tuning
        match config.codec {
            VideoCodec::Vp9 => {
                args.extend([
                    "-row-mt".to_string(),
                    "1".to_string(),
                    "-threads".to_string(),
                    "0".to_string(),
                ]);
            }
            VideoCodec::H264Nvenc => {
                args.extend([
                    "-rc:v".to_string(),
                    "vbr".to_string(),
                    "-cq:v".to_string(),
                    "23".to_string(),
                ]);
            }
            VideoCodec::H264 | VideoCodec::H265 => {
                args.extend(["-threads".to_string(), "0".to_string()]);
            }
            VideoCodec::H264Amf => {}
        }

        // Explicit bitrate target (CRF-only otherwise)
        if let Some(ref bitrate) = config.bitrate {
            args.extend(["-b:v".to_string(), bitrate.clone()]);
        }

        // Audio settings
        args.extend([
            "-c:a".to_string(),
            config.audio_codec.clone(),
            "-b:a".to_string(),
            config.audio_bitrate.clone(),
        ]);

        // Resolution
        if let Some(ref resolution) = config.resolution {
            args.extend(["-s".to_string(), resolution.clone()]);
        }

        // Frame rate
        if let Some(fps) = config.fps {
            args.extend(["-r".to_string(), fps.to_string()]);
        }

        // MP4 faststart for web playback
        if config.container == ContainerFormat::Mp4 {
            args.extend(["-movflags".to_string(), "+faststart".to_string()]);
        }

        // Log level and progress
        args.extend([
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            "-progress".to_string(),
            "pipe:2".to_string(),
        ]);

        // Extra args
        args.extend(self.config.extra_ffmpeg_args.iter().cloned());

        // Output
        args.push(output.to_string_lossy().to_string());

        args
    }

    /// Parses ffprobe JSON output into MediaInfo.
    fn parse_probe_output(path: &Path, output: &str) -> Result<MediaInfo, ConverterError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            format_name: String,
            duration: Option<String>,
            size: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: String,
            codec_name: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
        }

        let probe: ProbeOutput = serde_json::from_str(output).map_err(|e| {
            ConverterError::parse_error(format!("Failed to parse ffprobe output: {}", e))
        })?;

        let duration_secs = probe
            .format
            .duration
            .as_ref()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        let size_bytes = probe
            .format
            .size
            .as_ref()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        let video_stream = probe.streams.iter().find(|s| s.codec_type == "video");

        let format_name = probe
            .format
            .format_name
            .split(',')
            .next()
            .unwrap_or("unknown");

        Ok(MediaInfo {
            path: path.to_path_buf(),
            size_bytes,
            duration_secs,
            format: format_name.to_string(),
            video_codec: video_stream.and_then(|s| s.codec_name.clone()),
            video_width: video_stream.and_then(|s| s.width),
            video_height: video_stream.and_then(|s| s.height),
        })
    }

    /// Runs the conversion with optional progress reporting.
    async fn run_encode(
        &self,
        input: &Path,
        output: &Path,
        config: &VideoConfig,
        progress_tx: Option<mpsc::Sender<f32>>,
    ) -> Result<(), ConverterError> {
        if !input.exists() {
            return Err(ConverterError::InputNotFound {
                path: input.to_path_buf(),
            });
        }

        // Input duration is needed to turn out_time into a percentage.
        let input_info = self.probe(input).await.ok();
        let duration_secs = input_info.as_ref().map(|i| i.duration_secs);
        if let Some(ref info) = input_info {
            debug!(
                input = %input.display(),
                codec = ?info.video_codec,
                width = ?info.video_width,
                height = ?info.video_height,
                duration_secs = info.duration_secs,
                "Probed input video"
            );
        }

        let args = self.build_args(input, output, config);
        debug!("FFmpeg args: {:?}", args);

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConverterError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    ConverterError::Io(e)
                }
            })?;

        let stderr = child.stderr.take().expect("stderr should be captured");
        let mut reader = BufReader::new(stderr).lines();

        let time_regex = Regex::new(r"out_time_ms=(\d+)").ok();

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut last_progress_send = Instant::now();
            let progress_interval = Duration::from_millis(500);
            let mut error_output = String::new();

            while let Ok(Some(line)) = reader.next_line().await {
                // Capture error output for diagnostics
                if line.contains("Error") || line.contains("error") {
                    error_output.push_str(&line);
                    error_output.push('\n');
                }

                // Parse progress
                if let Some(ref re) = time_regex {
                    if let Some(caps) = re.captures(&line) {
                        if let (Some(ref tx), Some(dur)) = (&progress_tx, duration_secs) {
                            if dur > 0.0 && last_progress_send.elapsed() >= progress_interval {
                                if let Ok(ms) =
                                    caps.get(1).map_or("", |m| m.as_str()).parse::<f64>()
                                {
                                    let current_secs = ms / 1_000_000.0;
                                    let percent =
                                        (current_secs / dur * 100.0).min(100.0) as f32;
                                    // Non-blocking send; stale updates may be dropped
                                    let _ = tx.try_send(percent);
                                    last_progress_send = Instant::now();
                                }
                            }
                        }
                    }
                }
            }

            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, String), std::io::Error>((status, error_output))
        })
        .await;

        match result {
            Ok(Ok((status, error_output))) => {
                if !status.success() {
                    return Err(ConverterError::encode_failed(
                        format!("FFmpeg exited with code: {:?}", status.code()),
                        if error_output.is_empty() {
                            None
                        } else {
                            Some(error_output)
                        },
                    ));
                }
            }
            Ok(Err(e)) => return Err(ConverterError::Io(e)),
            Err(_) => {
                // Kill the process on timeout
                let _ = child.kill().await;
                return Err(ConverterError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        }

        // Verify the output exists
        tokio::fs::metadata(output)
            .await
            .map_err(|_| ConverterError::encode_failed("Output file not created", None))?;

        Ok(())
    }
}

#[async_trait]
impl VideoEncoder for FfmpegEncoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, ConverterError> {
        if !path.exists() {
            return Err(ConverterError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConverterError::FfprobeNotFound {
                        path: self.config.ffprobe_path.clone(),
                    }
                } else {
                    ConverterError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(ConverterError::parse_error(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe_output(path, &stdout)
    }

    async fn encode(
        &self,
        input: &Path,
        output: &Path,
        config: &VideoConfig,
    ) -> Result<(), ConverterError> {
        self.run_encode(input, output, config, None).await
    }

    async fn encode_with_progress(
        &self,
        input: &Path,
        output: &Path,
        config: &VideoConfig,
        progress_tx: mpsc::Sender<f32>,
    ) -> Result<(), ConverterError> {
        self.run_encode(input, output, config, Some(progress_tx))
            .await
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        // Check ffmpeg exists
        let ffmpeg_result = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffmpeg_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(ConverterError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                });
            }
            return Err(ConverterError::Io(e));
        }

        // Check ffprobe exists
        let ffprobe_result = Command::new(&self.config.ffprobe_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffprobe_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(ConverterError::FfprobeNotFound {
                    path: self.config.ffprobe_path.clone(),
                });
            }
            return Err(ConverterError::Io(e));
        }

        Ok(())
    }
}
