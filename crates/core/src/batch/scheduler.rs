//! Fixed-size concurrent batch scheduling.
//!
//! Files are processed in slices of `batch_size`: every handler in a
//! slice is launched before any of them is awaited, the whole slice is
//! joined, and only then does the next slice start. The batch size is
//! the concurrency ceiling; nothing else limits parallelism and nothing
//! exceeds it.

use std::future::Future;

/// Drives `handler` over `files` with at most `batch_size` invocations
/// in flight.
///
/// The handler receives each file together with its index in the
/// original list and must be infallible; failures are expected to be
/// folded into its return value. Results come back in input order:
/// slices are sequential, and within a slice `join_all` preserves
/// launch order regardless of completion order.
pub async fn run_in_batches<T, F, Fut>(files: &[String], batch_size: usize, handler: F) -> Vec<T>
where
    F: Fn(String, usize) -> Fut,
    Fut: Future<Output = T>,
{
    let batch_size = batch_size.max(1);
    let mut results = Vec::with_capacity(files.len());

    for (batch_index, batch) in files.chunks(batch_size).enumerate() {
        let offset = batch_index * batch_size;
        let tasks: Vec<_> = batch
            .iter()
            .enumerate()
            .map(|(i, file)| handler(file.clone(), offset + i))
            .collect();
        results.extend(futures::future::join_all(tasks).await);
    }

    results
}

/// Resolves the effective batch size.
///
/// An explicit positive request is used verbatim; otherwise the host's
/// core count minus one, with a floor of 1.
pub fn resolve_concurrency(requested: Option<usize>) -> usize {
    match requested {
        Some(n) if n >= 1 => n,
        _ => num_cpus::get().saturating_sub(1).max(1),
    }
}
