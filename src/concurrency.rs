//! Bounded parallelism over an ordered work list
//!
//! A fixed number of workers pull indices from one shared counter, so items are
//! started in list order while completions land in whatever order the work
//! finishes. Workers run as futures on the caller's task; nothing is spawned.

use futures::future::join_all;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Run `worker` over `items` with at most `limit` invocations in flight.
///
/// A worker returning `None` contributes nothing and does not stop its
/// siblings. The output order is unspecified; sort afterwards by a stable key.
pub async fn run_bounded<'a, T, R, F, Fut>(items: &'a [T], limit: usize, worker: F) -> Vec<R>
where
    F: Fn(&'a T, usize) -> Fut,
    Fut: Future<Output = Option<R>>,
{
    let next = AtomicUsize::new(0);
    let results = Mutex::new(Vec::with_capacity(items.len()));
    let worker_count = limit.max(1).min(items.len());

    {
        let next = &next;
        let results = &results;
        let worker = &worker;
        let lanes = (0..worker_count).map(|_| async move {
            loop {
                let index = next.fetch_add(1, Ordering::SeqCst);
                if index >= items.len() {
                    break;
                }
                if let Some(result) = worker(&items[index], index).await {
                    results.lock().push(result);
                }
            }
        });
        join_all(lanes).await;
    }

    results.into_inner()
}
