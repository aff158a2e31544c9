//! Working-set resolution and output directory handling.

use std::path::Path;

use crate::converter::ConverterError;

/// Lists file names in `dir` whose extension matches `extensions`
/// (case-insensitive, no leading dot). Results are sorted so runs are
/// reproducible across platforms.
pub fn list_media_files(dir: &Path, extensions: &[&str]) -> Result<Vec<String>, ConverterError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ConverterError::DirectoryUnreadable {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| {
            Path::new(name)
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| {
                    let ext = ext.to_ascii_lowercase();
                    extensions.iter().any(|e| *e == ext)
                })
                .unwrap_or(false)
        })
        .collect();

    files.sort();
    Ok(files)
}

/// Creates the output directory, including parents.
pub async fn ensure_output_dir(dir: &Path) -> Result<(), ConverterError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|_| ConverterError::OutputDirectoryFailed {
            path: dir.to_path_buf(),
        })
}

/// Derives the output file name: input stem plus the configured
/// extension (`photo.png` -> `photo.webp`). Duplicate basenames map to
/// the same output name and overwrite each other; the working set comes
/// from one directory listing or an explicit caller list, so that is
/// the caller's responsibility.
pub fn output_file_name(input: &str, extension: &str) -> String {
    let stem = Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(input);
    format!("{}.{}", stem, extension)
}
