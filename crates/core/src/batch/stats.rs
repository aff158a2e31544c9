//! Size statistics for converted files.

use std::path::Path;

use crate::converter::{ConversionStats, ConverterError};

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Formats a byte count with base-1024 units, two decimals, trailing
/// zeros trimmed. Zero is the literal "0 Bytes" (log of zero is
/// undefined).
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);

    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[exponent])
}

/// Stats both files and reports their sizes and the reduction
/// percentage, one decimal.
pub async fn file_stats(input: &Path, output: &Path) -> Result<ConversionStats, ConverterError> {
    let input_meta = tokio::fs::metadata(input).await?;
    let output_meta = tokio::fs::metadata(output).await?;

    let reduction = if input_meta.len() == 0 {
        0.0
    } else {
        (1.0 - output_meta.len() as f64 / input_meta.len() as f64) * 100.0
    };

    let file_name = |path: &Path| {
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    };

    Ok(ConversionStats {
        input: file_name(input),
        output: file_name(output),
        input_size: format_bytes(input_meta.len()),
        output_size: format_bytes(output_meta.len()),
        reduction: format!("{:.1}", reduction),
    })
}
