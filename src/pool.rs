//! Bounded index-keyed worker pool.
//!
//! Fans independent per-index tasks out over a bounded set of workers and
//! writes each result back into a pre-sized slot keyed by the original
//! index, so output order is deterministic regardless of completion order.
//! The caller blocks on the join barrier; a task failure lands in its slot
//! as a recorded error instead of aborting the batch. No shared mutable
//! state is written concurrently.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

/// Run `task(i)` for every `i` in `0..items` on at most `width` blocking
/// workers. Returns one slot per index; `Err` carries the task's own error
/// message or a panic/join description.
pub async fn run_indexed<T, F>(items: usize, width: usize, task: F) -> Vec<Result<T, String>>
where
    T: Send + 'static,
    F: Fn(usize) -> Result<T, String> + Send + Sync + 'static,
{
    let width = width.max(1);
    let task = Arc::new(task);
    let semaphore = Arc::new(Semaphore::new(width));
    let mut join_set: JoinSet<(usize, Result<T, String>)> = JoinSet::new();

    for index in 0..items {
        let task = Arc::clone(&task);
        let semaphore = Arc::clone(&semaphore);
        join_set.spawn(async move {
            // Semaphore is never closed, acquire cannot fail.
            let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
            let result =
                tokio::task::spawn_blocking(move || task(index)).await;
            match result {
                Ok(inner) => (index, inner),
                Err(join_err) => (index, Err(format!("worker task failed: {}", join_err))),
            }
        });
    }

    let mut slots: Vec<Option<Result<T, String>>> = (0..items).map(|_| None).collect();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(join_err) => warn!("worker join error: {}", join_err),
        }
    }

    slots
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| Err("worker produced no result".to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_results_keyed_by_original_index() {
        let results = run_indexed(8, 3, |i| Ok::<usize, String>(i * 10)).await;
        for (i, slot) in results.iter().enumerate() {
            assert_eq!(*slot.as_ref().unwrap(), i * 10);
        }
    }

    #[tokio::test]
    async fn test_per_item_error_does_not_abort_batch() {
        let results = run_indexed(4, 2, |i| {
            if i == 2 {
                Err("provider unavailable".to_string())
            } else {
                Ok(i)
            }
        })
        .await;
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        assert_eq!(results[2].as_ref().unwrap_err(), "provider unavailable");
        assert!(results[3].is_ok());
    }

    #[tokio::test]
    async fn test_width_bounds_concurrency() {
        static IN_FLIGHT: AtomicUsize = AtomicUsize::new(0);
        static PEAK: AtomicUsize = AtomicUsize::new(0);

        let _ = run_indexed(16, 4, |_| {
            let now = IN_FLIGHT.fetch_add(1, Ordering::SeqCst) + 1;
            PEAK.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(10));
            IN_FLIGHT.fetch_sub(1, Ordering::SeqCst);
            Ok::<(), String>(())
        })
        .await;

        assert!(PEAK.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let results = run_indexed(0, 4, |i| Ok::<usize, String>(i)).await;
        assert!(results.is_empty());
    }
}
