//! Terminal rendering of progress events and the final report.

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use mediapress_core::{ConversionReport, ProgressEvent, ProgressStatus};

/// Spawns a task that prints progress events until the channel closes.
pub fn spawn_renderer(mut rx: mpsc::Receiver<ProgressEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            render(&event);
        }
    })
}

fn render(event: &ProgressEvent) {
    let prefix = format!("[{}/{}]", event.current, event.total);
    match event.status {
        ProgressStatus::Converting => match event.percent {
            Some(percent) if percent > 0.0 => {
                println!("{} converting {} ({:.1}%)", prefix, event.file, percent)
            }
            _ => println!("{} converting {}", prefix, event.file),
        },
        ProgressStatus::Completed => println!("{} completed {}", prefix, event.file),
        ProgressStatus::Failed => eprintln!(
            "{} failed {}: {}",
            prefix,
            event.file,
            event.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

/// Prints the final report, human-readable or as JSON.
pub fn print_report(report: &ConversionReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!();
    println!(
        "Converted {} of {} files",
        report.successes.len(),
        report.total()
    );
    for stats in &report.successes {
        println!(
            "  {} -> {}  {} -> {}  ({}% smaller)",
            stats.input, stats.output, stats.input_size, stats.output_size, stats.reduction
        );
    }
    if !report.failures.is_empty() {
        println!();
        println!("Failed:");
        for failure in &report.failures {
            println!("  {}: {}", failure.file, failure.error);
        }
    }
    Ok(())
}
