//! Batch engine integration tests.
//!
//! These tests drive the image and video batch converters with mock
//! encoders and verify:
//! - Working-set resolution (directory filtering vs. explicit selection)
//! - One outcome per input file, in input order
//! - Failure isolation (a failed file never aborts siblings)
//! - Pre-flight and infrastructure error behavior
//! - Progress event sequences, including fractional video progress
//! - The structural concurrency ceiling

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;

use mediapress_core::{
    converter::{
        ConverterError, ImageConfig, ImageFormat, ProgressEvent, ProgressStatus, VideoConfig,
    },
    testing::{MockImageEncoder, MockVideoEncoder},
    ImageBatchConverter, VideoBatchConverter,
};

/// Test helper owning the input/output directories and mock encoders.
struct TestHarness {
    input_dir: TempDir,
    output_root: TempDir,
    image_encoder: MockImageEncoder,
    video_encoder: MockVideoEncoder,
}

impl TestHarness {
    fn new() -> Self {
        Self {
            input_dir: TempDir::new().expect("Failed to create input dir"),
            output_root: TempDir::new().expect("Failed to create output root"),
            image_encoder: MockImageEncoder::new(),
            video_encoder: MockVideoEncoder::new(),
        }
    }

    fn input_path(&self) -> &std::path::Path {
        self.input_dir.path()
    }

    /// Output dir inside a fresh root, not created until the engine does so.
    fn output_path(&self) -> PathBuf {
        self.output_root.path().join("out")
    }

    fn create_file(&self, name: &str, bytes: usize) -> PathBuf {
        let path = self.input_dir.path().join(name);
        std::fs::write(&path, vec![0u8; bytes]).expect("Failed to create input file");
        path
    }

    fn image_converter(&self) -> ImageBatchConverter {
        ImageBatchConverter::new(
            Arc::new(self.image_encoder.clone()),
            ImageConfig::default(),
        )
    }

    fn video_converter(&self) -> VideoBatchConverter {
        VideoBatchConverter::new(
            Arc::new(self.video_encoder.clone()),
            VideoConfig::default(),
        )
    }
}

// =============================================================================
// Working-set resolution
// =============================================================================

#[tokio::test]
async fn test_directory_listing_filters_supported_extensions() {
    let harness = TestHarness::new();
    harness.create_file("a.png", 1000);
    harness.create_file("b.jpg", 1000);
    harness.create_file("c.JPEG", 1000);
    harness.create_file("notes.txt", 1000);
    harness.create_file("clip.mp4", 1000);

    let report = harness
        .image_converter()
        .convert(harness.input_path(), &harness.output_path(), &[], None, Some(2))
        .await
        .unwrap();

    assert_eq!(report.successes.len(), 3);
    assert_eq!(report.failures.len(), 0);
    assert_eq!(harness.image_encoder.call_count(), 3);
}

#[tokio::test]
async fn test_explicit_selection_is_used_verbatim() {
    let harness = TestHarness::new();
    harness.create_file("a.png", 1000);
    harness.create_file("b.png", 1000);

    let selected = vec!["b.png".to_string()];
    let report = harness
        .image_converter()
        .convert(
            harness.input_path(),
            &harness.output_path(),
            &selected,
            None,
            Some(1),
        )
        .await
        .unwrap();

    assert_eq!(report.successes.len(), 1);
    assert_eq!(report.successes[0].input, "b.png");
    assert_eq!(report.successes[0].output, "b.webp");
}

#[tokio::test]
async fn test_empty_directory_fails_without_creating_output_dir() {
    let harness = TestHarness::new();
    let output = harness.output_path();

    let result = harness
        .image_converter()
        .convert(harness.input_path(), &output, &[], None, Some(1))
        .await;

    assert!(matches!(result, Err(ConverterError::NoFilesFound { .. })));
    assert!(!output.exists(), "output dir must not be created");
    assert_eq!(harness.image_encoder.call_count(), 0);
}

#[tokio::test]
async fn test_unsupported_extensions_only_counts_as_empty() {
    let harness = TestHarness::new();
    harness.create_file("readme.txt", 100);
    harness.create_file("data.bin", 100);

    let result = harness
        .image_converter()
        .convert(harness.input_path(), &harness.output_path(), &[], None, None)
        .await;

    let err = result.unwrap_err();
    assert!(err.to_string().contains("No image files found"));
}

#[tokio::test]
async fn test_missing_input_directory_is_fatal() {
    let harness = TestHarness::new();
    let missing = harness.input_path().join("nope");

    let result = harness
        .image_converter()
        .convert(&missing, &harness.output_path(), &[], None, Some(1))
        .await;

    assert!(matches!(
        result,
        Err(ConverterError::DirectoryUnreadable { .. })
    ));
}

// =============================================================================
// Outcomes and ordering
// =============================================================================

#[tokio::test]
async fn test_stats_reflect_size_reduction() {
    let harness = TestHarness::new();
    harness.create_file("photo.png", 1000);
    harness.image_encoder.set_output_bytes(400);

    let report = harness
        .image_converter()
        .convert(harness.input_path(), &harness.output_path(), &[], None, Some(1))
        .await
        .unwrap();

    let stats = &report.successes[0];
    assert_eq!(stats.input, "photo.png");
    assert_eq!(stats.output, "photo.webp");
    assert_eq!(stats.input_size, "1000 Bytes");
    assert_eq!(stats.output_size, "400 Bytes");
    assert_eq!(stats.reduction, "60.0");
    assert!(harness.output_path().join("photo.webp").exists());
}

#[tokio::test]
async fn test_outcomes_follow_selection_order() {
    let harness = TestHarness::new();
    for name in ["a.png", "b.png", "c.png"] {
        harness.create_file(name, 1000);
    }

    let selected: Vec<String> = ["c.png", "a.png", "b.png"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let report = harness
        .image_converter()
        .convert(
            harness.input_path(),
            &harness.output_path(),
            &selected,
            None,
            Some(2),
        )
        .await
        .unwrap();

    let inputs: Vec<&str> = report.successes.iter().map(|s| s.input.as_str()).collect();
    assert_eq!(inputs, vec!["c.png", "a.png", "b.png"]);
}

#[tokio::test]
async fn test_duplicate_selection_stress() {
    let harness = TestHarness::new();
    harness.create_file("same.png", 1000);

    let selected: Vec<String> = std::iter::repeat("same.png".to_string()).take(5).collect();
    let report = harness
        .image_converter()
        .convert(
            harness.input_path(),
            &harness.output_path(),
            &selected,
            None,
            Some(3),
        )
        .await
        .unwrap();

    // Every attempt gets an outcome; later writes overwrite the same output.
    assert_eq!(report.successes.len(), 5);
    assert_eq!(report.failures.len(), 0);
    assert!(harness.output_path().join("same.webp").exists());
}

// =============================================================================
// Failure isolation
// =============================================================================

#[tokio::test]
async fn test_failed_file_does_not_abort_siblings() {
    let harness = TestHarness::new();
    for name in ["a.png", "b.png", "c.png"] {
        harness.create_file(name, 1000);
    }
    harness.image_encoder.fail_on("b.png");

    let report = harness
        .image_converter()
        .convert(harness.input_path(), &harness.output_path(), &[], None, Some(3))
        .await
        .unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.successes.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].file, "b.png");
    assert!(report.failures[0].error.contains("simulated encoder failure"));
}

#[tokio::test]
async fn test_missing_input_file_becomes_failure_outcome() {
    let harness = TestHarness::new();
    harness.create_file("real.png", 1000);

    let selected: Vec<String> = ["real.png", "nonexistent.png"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let report = harness
        .image_converter()
        .convert(
            harness.input_path(),
            &harness.output_path(),
            &selected,
            None,
            Some(2),
        )
        .await
        .unwrap();

    assert_eq!(report.successes.len(), 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].file, "nonexistent.png");
    assert!(report.failures[0].error.contains("not found"));
}

#[tokio::test]
async fn test_all_failures_is_a_valid_report() {
    let harness = TestHarness::new();
    harness.create_file("a.png", 1000);
    harness.create_file("b.png", 1000);
    harness.image_encoder.fail_on("a.png");
    harness.image_encoder.fail_on("b.png");

    let report = harness
        .image_converter()
        .convert(harness.input_path(), &harness.output_path(), &[], None, Some(2))
        .await
        .unwrap();

    assert_eq!(report.successes.len(), 0);
    assert_eq!(report.failures.len(), 2);
    assert!(report.has_failures());
}

// =============================================================================
// Pre-flight validation
// =============================================================================

#[tokio::test]
async fn test_invalid_config_fails_before_any_task() {
    let harness = TestHarness::new();
    harness.create_file("a.png", 1000);

    let converter = ImageBatchConverter::new(
        Arc::new(harness.image_encoder.clone()),
        ImageConfig {
            quality: 150,
            format: ImageFormat::Webp,
            lossless: false,
        },
    );

    let output = harness.output_path();
    let result = converter
        .convert(harness.input_path(), &output, &[], None, Some(1))
        .await;

    assert!(matches!(result, Err(ConverterError::InvalidConfig { .. })));
    assert_eq!(harness.image_encoder.call_count(), 0);
    assert!(!output.exists());
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn test_in_flight_encodes_never_exceed_batch_size() {
    let harness = TestHarness::new();
    for i in 0..6 {
        harness.create_file(&format!("img{}.png", i), 1000);
    }
    harness.image_encoder.set_encode_delay(Duration::from_millis(40));

    let report = harness
        .image_converter()
        .convert(harness.input_path(), &harness.output_path(), &[], None, Some(2))
        .await
        .unwrap();

    assert_eq!(report.successes.len(), 6);
    let peak = harness.image_encoder.peak_in_flight();
    assert!(peak <= 2, "peak in-flight {} exceeded batch size", peak);
}

// =============================================================================
// Progress events
// =============================================================================

#[tokio::test]
async fn test_image_progress_sequence_per_file() {
    let harness = TestHarness::new();
    harness.create_file("a.png", 1000);
    harness.create_file("b.png", 1000);
    harness.image_encoder.fail_on("b.png");

    let (tx, mut rx) = mpsc::channel(100);
    harness
        .image_converter()
        .convert(
            harness.input_path(),
            &harness.output_path(),
            &[],
            Some(tx),
            Some(1),
        )
        .await
        .unwrap();

    let mut events: Vec<ProgressEvent> = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    let mut by_file: HashMap<String, Vec<ProgressStatus>> = HashMap::new();
    for event in &events {
        assert_eq!(event.total, 2);
        assert!(event.current >= 1 && event.current <= 2);
        // Image conversions never carry a fractional percentage.
        assert!(event.percent.is_none());
        by_file.entry(event.file.clone()).or_default().push(event.status);
    }

    assert_eq!(
        by_file.get("a.png").unwrap().as_slice(),
        &[ProgressStatus::Converting, ProgressStatus::Completed]
    );
    assert_eq!(
        by_file.get("b.png").unwrap().as_slice(),
        &[ProgressStatus::Converting, ProgressStatus::Failed]
    );

    let failed = events
        .iter()
        .find(|e| e.status == ProgressStatus::Failed)
        .unwrap();
    assert!(failed.error.is_some());
}

#[tokio::test]
async fn test_video_progress_carries_increasing_percentages() {
    let harness = TestHarness::new();
    harness.create_file("clip.mp4", 2000);
    harness.video_encoder.set_progress_steps(4);
    harness
        .video_encoder
        .set_encode_duration(Duration::from_millis(40));

    let (tx, mut rx) = mpsc::channel(100);
    let report = harness
        .video_converter()
        .convert(
            harness.input_path(),
            &harness.output_path(),
            &[],
            Some(tx),
            Some(1),
        )
        .await
        .unwrap();

    assert_eq!(report.successes.len(), 1);
    assert_eq!(report.successes[0].output, "clip.webm");

    let mut percents = Vec::new();
    let mut saw_completed = false;
    while let Some(event) = rx.recv().await {
        match event.status {
            ProgressStatus::Converting => {
                if let Some(p) = event.percent {
                    assert!((0.0..=100.0).contains(&p));
                    percents.push(p);
                }
            }
            ProgressStatus::Completed => saw_completed = true,
            ProgressStatus::Failed => panic!("unexpected failure"),
        }
    }

    assert!(saw_completed);
    // Initial 0% plus whatever the bridge delivered, in order.
    assert!(!percents.is_empty());
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
}

// =============================================================================
// Video engine
// =============================================================================

#[tokio::test]
async fn test_video_batch_mixed_outcomes() {
    let harness = TestHarness::new();
    harness.create_file("one.mp4", 1000);
    harness.create_file("two.mov", 1000);
    harness.create_file("three.mkv", 1000);
    harness.video_encoder.fail_on("two.mov").await;
    harness
        .video_encoder
        .set_encode_duration(Duration::from_millis(5));

    let report = harness
        .video_converter()
        .convert(harness.input_path(), &harness.output_path(), &[], None, Some(2))
        .await
        .unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.successes.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].file, "two.mov");
    assert_eq!(harness.video_encoder.call_count().await, 3);
}

#[tokio::test]
async fn test_video_output_uses_container_extension() {
    let harness = TestHarness::new();
    harness.create_file("movie.avi", 1000);
    harness
        .video_encoder
        .set_encode_duration(Duration::from_millis(1));

    let report = harness
        .video_converter()
        .convert(harness.input_path(), &harness.output_path(), &[], None, Some(1))
        .await
        .unwrap();

    assert_eq!(report.successes[0].output, "movie.webm");
    assert!(harness.output_path().join("movie.webm").exists());
}
