//! The bounded-concurrency batch conversion engine.
//!
//! A run takes an input folder, an output folder, a validated
//! configuration and an optional explicit file selection, resolves the
//! working set, and drives per-file conversions in fixed-size
//! concurrent batches. Outcomes are collected in input order and
//! partitioned into successes and failures; a failed file never aborts
//! its siblings or the run.

mod files;
mod image;
mod scheduler;
mod stats;
mod video;

pub use self::image::{ImageBatchConverter, IMAGE_EXTENSIONS};
pub use files::{list_media_files, output_file_name};
pub use scheduler::{resolve_concurrency, run_in_batches};
pub use stats::{file_stats, format_bytes};
pub use video::{VideoBatchConverter, VIDEO_EXTENSIONS};

use crate::converter::ProgressEvent;
use tokio::sync::mpsc;

/// Sends a lifecycle event to the sink, if one is attached.
pub(crate) async fn report(progress: &Option<mpsc::Sender<ProgressEvent>>, event: ProgressEvent) {
    if let Some(tx) = progress {
        let _ = tx.send(event).await;
    }
}
