//! Mock encoders for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};

use crate::converter::{
    ConverterError, ImageConfig, ImageEncoder, MediaInfo, VideoConfig, VideoEncoder,
};

/// A recorded encode call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedEncode {
    /// Input path as passed to the encoder.
    pub input: PathBuf,
    /// Output path as passed to the encoder.
    pub output: PathBuf,
    /// Whether the call succeeded.
    pub success: bool,
}

/// Mock implementation of the `ImageEncoder` trait.
///
/// Provides controllable behavior for engine tests:
/// - Records every encode call for assertions
/// - Fails configured file names while siblings succeed
/// - Writes a fixed number of bytes so size stats are computable
/// - Tracks peak in-flight calls to assert the concurrency ceiling
#[derive(Debug, Clone)]
pub struct MockImageEncoder {
    calls: Arc<Mutex<Vec<RecordedEncode>>>,
    fail_files: Arc<Mutex<HashSet<String>>>,
    output_bytes: Arc<AtomicUsize>,
    encode_delay_ms: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl Default for MockImageEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockImageEncoder {
    /// Create a new mock image encoder producing 400-byte outputs.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_files: Arc::new(Mutex::new(HashSet::new())),
            output_bytes: Arc::new(AtomicUsize::new(400)),
            encode_delay_ms: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get all recorded encode calls.
    pub fn recorded(&self) -> Vec<RecordedEncode> {
        self.calls.lock().unwrap().clone()
    }

    /// Get the number of encode calls performed.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Make encoding fail for the given file name (basename match).
    pub fn fail_on(&self, file: &str) {
        self.fail_files.lock().unwrap().insert(file.to_string());
    }

    /// Set the number of bytes written to each output file.
    pub fn set_output_bytes(&self, bytes: usize) {
        self.output_bytes.store(bytes, Ordering::SeqCst);
    }

    /// Set a simulated per-call encode duration.
    pub fn set_encode_delay(&self, delay: Duration) {
        self.encode_delay_ms
            .store(delay.as_millis() as usize, Ordering::SeqCst);
    }

    /// Highest number of concurrent encode calls observed.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn should_fail(&self, input: &Path) -> bool {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.fail_files.lock().unwrap().contains(&name)
    }
}

impl ImageEncoder for MockImageEncoder {
    fn name(&self) -> &str {
        "mock-image"
    }

    fn encode(
        &self,
        input: &Path,
        output: &Path,
        _config: &ImageConfig,
    ) -> Result<(), ConverterError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.encode_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            // Runs on the blocking pool, so a thread sleep is fine here.
            std::thread::sleep(Duration::from_millis(delay as u64));
        }

        let result = if self.should_fail(input) {
            Err(ConverterError::encode_failed(
                "simulated encoder failure",
                None,
            ))
        } else if !input.exists() {
            Err(ConverterError::InputNotFound {
                path: input.to_path_buf(),
            })
        } else {
            let bytes = self.output_bytes.load(Ordering::SeqCst);
            std::fs::write(output, vec![0u8; bytes]).map_err(ConverterError::Io)
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(RecordedEncode {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            success: result.is_ok(),
        });

        result
    }
}

/// Mock implementation of the `VideoEncoder` trait.
///
/// Mirrors `MockImageEncoder`, plus simulated fractional progress:
/// `encode_with_progress` emits `progress_steps` evenly spaced
/// percentages before settling.
#[derive(Debug, Clone)]
pub struct MockVideoEncoder {
    calls: Arc<RwLock<Vec<RecordedEncode>>>,
    fail_files: Arc<RwLock<HashSet<String>>>,
    output_bytes: Arc<AtomicUsize>,
    encode_duration_ms: Arc<AtomicUsize>,
    progress_steps: Arc<AtomicUsize>,
}

impl Default for MockVideoEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVideoEncoder {
    /// Create a new mock video encoder producing 400-byte outputs.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
            fail_files: Arc::new(RwLock::new(HashSet::new())),
            output_bytes: Arc::new(AtomicUsize::new(400)),
            encode_duration_ms: Arc::new(AtomicUsize::new(20)),
            progress_steps: Arc::new(AtomicUsize::new(4)),
        }
    }

    /// Get all recorded encode calls.
    pub async fn recorded(&self) -> Vec<RecordedEncode> {
        self.calls.read().await.clone()
    }

    /// Get the number of encode calls performed.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Make encoding fail for the given file name (basename match).
    pub async fn fail_on(&self, file: &str) {
        self.fail_files.write().await.insert(file.to_string());
    }

    /// Set the number of bytes written to each output file.
    pub fn set_output_bytes(&self, bytes: usize) {
        self.output_bytes.store(bytes, Ordering::SeqCst);
    }

    /// Set the simulated encode duration.
    pub fn set_encode_duration(&self, duration: Duration) {
        self.encode_duration_ms
            .store(duration.as_millis() as usize, Ordering::SeqCst);
    }

    /// Set the number of progress updates emitted per encode.
    pub fn set_progress_steps(&self, steps: usize) {
        self.progress_steps.store(steps, Ordering::SeqCst);
    }

    async fn should_fail(&self, input: &Path) -> bool {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.fail_files.read().await.contains(&name)
    }

    async fn run_encode(
        &self,
        input: &Path,
        output: &Path,
        progress_tx: Option<mpsc::Sender<f32>>,
    ) -> Result<(), ConverterError> {
        let duration_ms = self.encode_duration_ms.load(Ordering::SeqCst) as u64;
        let steps = self.progress_steps.load(Ordering::SeqCst) as u64;

        let result = if self.should_fail(input).await {
            Err(ConverterError::encode_failed(
                "simulated encoder failure",
                None,
            ))
        } else if !input.exists() {
            Err(ConverterError::InputNotFound {
                path: input.to_path_buf(),
            })
        } else {
            if let Some(tx) = progress_tx {
                let step_ms = if steps > 0 { duration_ms / steps } else { 0 };
                for i in 0..steps {
                    let percent = ((i + 1) as f32 / steps as f32) * 100.0;
                    let _ = tx.send(percent).await;
                    tokio::time::sleep(Duration::from_millis(step_ms)).await;
                }
            } else if duration_ms > 0 {
                tokio::time::sleep(Duration::from_millis(duration_ms)).await;
            }

            let bytes = self.output_bytes.load(Ordering::SeqCst);
            tokio::fs::write(output, vec![0u8; bytes])
                .await
                .map_err(ConverterError::Io)
        };

        self.calls.write().await.push(RecordedEncode {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            success: result.is_ok(),
        });

        result
    }
}

#[async_trait]
impl VideoEncoder for MockVideoEncoder {
    fn name(&self) -> &str {
        "mock-video"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, ConverterError> {
        Ok(MediaInfo {
            path: path.to_path_buf(),
            size_bytes: 100 * 1024 * 1024,
            duration_secs: 120.0,
            format: "mov".to_string(),
            video_codec: Some("h264".to_string()),
            video_width: Some(1920),
            video_height: Some(1080),
        })
    }

    async fn encode(
        &self,
        input: &Path,
        output: &Path,
        _config: &VideoConfig,
    ) -> Result<(), ConverterError> {
        self.run_encode(input, output, None).await
    }

    async fn encode_with_progress(
        &self,
        input: &Path,
        output: &Path,
        _config: &VideoConfig,
        progress_tx: mpsc::Sender<f32>,
    ) -> Result<(), ConverterError> {
        self.run_encode(input, output, Some(progress_tx)).await
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_image_mock_writes_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.webp");
        std::fs::write(&input, vec![0u8; 1000]).unwrap();

        let encoder = MockImageEncoder::new();
        encoder
            .encode(&input, &output, &ImageConfig::default())
            .unwrap();

        assert_eq!(std::fs::metadata(&output).unwrap().len(), 400);
        assert_eq!(encoder.call_count(), 1);
        assert!(encoder.recorded()[0].success);
    }

    #[test]
    fn test_image_mock_failure_injection() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("bad.png");
        std::fs::write(&input, b"x").unwrap();

        let encoder = MockImageEncoder::new();
        encoder.fail_on("bad.png");

        let result = encoder.encode(&input, &dir.path().join("out.webp"), &ImageConfig::default());
        assert!(result.is_err());
        assert!(!encoder.recorded()[0].success);
    }

    #[tokio::test]
    async fn test_video_mock_progress_updates() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.mp4");
        let output = dir.path().join("out.webm");
        std::fs::write(&input, vec![0u8; 1000]).unwrap();

        let encoder = MockVideoEncoder::new();
        encoder.set_encode_duration(Duration::from_millis(40));
        encoder.set_progress_steps(4);

        let (tx, mut rx) = mpsc::channel(16);
        encoder
            .encode_with_progress(&input, &output, &VideoConfig::default(), tx)
            .await
            .unwrap();

        let mut percents = Vec::new();
        while let Some(p) = rx.recv().await {
            percents.push(p);
        }
        assert_eq!(percents.len(), 4);
        assert!(percents.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(percents.last().copied(), Some(100.0));
    }

    #[tokio::test]
    async fn test_video_mock_missing_input() {
        let dir = TempDir::new().unwrap();
        let encoder = MockVideoEncoder::new();
        let result = encoder
            .encode(
                &dir.path().join("missing.mp4"),
                &dir.path().join("out.webm"),
                &VideoConfig::default(),
            )
            .await;
        assert!(matches!(result, Err(ConverterError::InputNotFound { .. })));
    }
}
