//! Bounded task pool
//!
//! Runs an async operation over every item of a list while keeping at most `limit`
//! operations unsettled. Outputs come back in input order regardless of which
//! operation finishes first. The pool never retries; each slot holds whatever its
//! operation settled with, `Err` included.
//!
//! ```
//! use flow_run_export::pool::run_bounded;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let doubled = run_bounded(vec![1, 2, 3], 2, |n| async move { n * 2 }).await;
//! assert_eq!(doubled, vec![2, 4, 6]);
//! # }
//! ```

use futures::FutureExt;
use futures::stream::{self, StreamExt};
use std::future::Future;

/// Execute `op` over `items` with at most `limit` operations in flight.
///
/// A new operation starts as soon as any outstanding one settles. A `limit` of 0
/// is treated as 1. All futures are polled inside the calling task, so the pool
/// adds no threads of its own.
pub async fn run_bounded<I, T, F, Fut>(items: I, limit: usize, mut op: F) -> Vec<Fut::Output>
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Fut,
    Fut: Future,
{
    let limit = limit.max(1);

    let mut settled: Vec<(usize, Fut::Output)> = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| op(item).map(move |output| (index, output)))
        .buffer_unordered(limit)
        .collect()
        .await;

    settled.sort_unstable_by_key(|(index, _)| *index);
    settled.into_iter().map(|(_, output)| output).collect()
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Tracks how many operations are unsettled and the highest value seen
    #[derive(Default)]
    struct InFlight {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    impl InFlight {
        fn enter(&self) {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
        }

        fn leave(&self) {
            self.current.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn empty_input_yields_empty_output() {
        let out: Vec<u32> = run_bounded(Vec::<u32>::new(), 4, |n| async move { n }).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn results_follow_input_order_not_completion_order() {
        // Earlier items sleep longer, so they finish last
        let delays = vec![40u64, 30, 20, 10, 0];
        let out = run_bounded(delays.clone(), 5, |ms| async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            ms
        })
        .await;
        assert_eq!(out, delays);
    }

    #[tokio::test]
    async fn never_exceeds_limit() {
        let tracker = Arc::new(InFlight::default());
        let items: Vec<u64> = (0..25).collect();

        let out = run_bounded(items, 3, |n| {
            let tracker = Arc::clone(&tracker);
            async move {
                tracker.enter();
                tokio::time::sleep(Duration::from_millis(1 + n % 4)).await;
                tracker.leave();
                n
            }
        })
        .await;

        assert_eq!(out.len(), 25);
        assert_eq!(out, (0..25).collect::<Vec<_>>());
        let peak = tracker.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak in-flight was {peak}");
        assert_eq!(peak, 3, "pool should saturate its limit");
    }

    #[tokio::test]
    async fn slow_head_does_not_block_free_slots() {
        // With limit 2, item 0 sleeps long; items 1..=4 must all run meanwhile
        let started = Arc::new(AtomicUsize::new(0));
        let started_before_head_done = Arc::new(AtomicUsize::new(0));

        run_bounded(0..5u64, 2, |n| {
            let started = Arc::clone(&started);
            let before = Arc::clone(&started_before_head_done);
            async move {
                started.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    tokio::time::sleep(Duration::from_millis(80)).await;
                    before.store(started.load(Ordering::SeqCst), Ordering::SeqCst);
                } else {
                    tokio::time::sleep(Duration::from_millis(2)).await;
                }
            }
        })
        .await;

        assert_eq!(started_before_head_done.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn limit_of_one_runs_sequentially() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let tracker = Arc::new(InFlight::default());

        run_bounded(vec!["a", "b", "c"], 1, |name| {
            let log = Arc::clone(&log);
            let tracker = Arc::clone(&tracker);
            async move {
                tracker.enter();
                log.lock().unwrap().push(format!("start {name}"));
                tokio::task::yield_now().await;
                log.lock().unwrap().push(format!("end {name}"));
                tracker.leave();
            }
        })
        .await;

        assert_eq!(tracker.peak.load(Ordering::SeqCst), 1);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["start a", "end a", "start b", "end b", "start c", "end c"]
        );
    }

    #[tokio::test]
    async fn limit_above_item_count_runs_everything_at_once() {
        let tracker = Arc::new(InFlight::default());

        run_bounded(0..4, 100, |_| {
            let tracker = Arc::clone(&tracker);
            async move {
                tracker.enter();
                tokio::time::sleep(Duration::from_millis(10)).await;
                tracker.leave();
            }
        })
        .await;

        assert_eq!(tracker.peak.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn zero_limit_is_treated_as_one() {
        let out = run_bounded(vec![1, 2], 0, |n| async move { n + 1 }).await;
        assert_eq!(out, vec![2, 3]);
    }

    #[tokio::test]
    async fn failures_are_returned_in_their_slot() {
        let out = run_bounded(vec![1, 2, 3, 4], 2, |n| async move {
            if n % 2 == 0 {
                Err(format!("item {n} failed"))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(
            out,
            vec![
                Ok(1),
                Err("item 2 failed".to_string()),
                Ok(3),
                Err("item 4 failed".to_string())
            ]
        );
    }
}
