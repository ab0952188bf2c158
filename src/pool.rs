//! Bounded worker pool over one shared backlog
//!
//! A fixed number of workers each repeatedly pull the next unclaimed unit from
//! a single shared queue until it is exhausted, so uneven per-unit duration
//! never leaves a worker idle while units queue up behind another. The pool
//! performs no retries — retry policy lives entirely inside the units it runs.

use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// A unit of work; records its own failures and never panics
pub type WorkUnit<'a> = BoxFuture<'a, ()>;

/// Run every unit exactly once with at most `concurrency` in flight
///
/// `on_progress(completed, total)` fires after each unit finishes, success or
/// not. The completed counter is advisory — workers race on the exact value
/// they report, which is acceptable for progress display. Completion order
/// carries no guarantees; callers must not derive placement from it.
pub async fn run<'a, F>(units: Vec<WorkUnit<'a>>, concurrency: usize, on_progress: F)
where
    F: Fn(usize, usize) + Send + Sync,
{
    let total = units.len();
    if total == 0 {
        return;
    }

    let backlog = Mutex::new(VecDeque::from(units));
    let completed = AtomicUsize::new(0);
    let workers = concurrency.clamp(1, total);

    let worker_loops = (0..workers).map(|_| async {
        loop {
            let unit = backlog.lock().await.pop_front();
            let Some(unit) = unit else {
                break;
            };
            unit.await;
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            on_progress(done, total);
        }
    });

    futures::future::join_all(worker_loops).await;
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::Arc;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn every_unit_runs_exactly_once() {
        let ran = Arc::new(AtomicUsize::new(0));
        let units: Vec<WorkUnit> = (0..25)
            .map(|_| {
                let ran = ran.clone();
                async move {
                    ran.fetch_add(1, Ordering::SeqCst);
                }
                .boxed()
            })
            .collect();

        run(units, 4, |_, _| {}).await;

        assert_eq!(ran.load(Ordering::SeqCst), 25);
    }

    #[tokio::test]
    async fn in_flight_units_never_exceed_concurrency_limit() {
        let in_flight = Arc::new(AtomicI64::new(0));
        let max_observed = Arc::new(AtomicI64::new(0));

        let units: Vec<WorkUnit> = (0..30)
            .map(|_| {
                let in_flight = in_flight.clone();
                let max_observed = max_observed.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_observed.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                }
                .boxed()
            })
            .collect();

        run(units, 6, |_, _| {}).await;

        let max = max_observed.load(Ordering::SeqCst);
        assert!(
            max <= 6,
            "observed {max} simultaneous units, limit was 6"
        );
        assert!(max > 1, "pool should actually run units concurrently");
    }

    #[tokio::test]
    async fn progress_fires_after_each_unit_and_reaches_total() {
        let events: Arc<StdMutex<Vec<(usize, usize)>>> = Arc::new(StdMutex::new(Vec::new()));
        let events_clone = events.clone();

        let units: Vec<WorkUnit> = (0..10).map(|_| async {}.boxed()).collect();

        run(units, 3, move |done, total| {
            events_clone.lock().unwrap().push((done, total));
        })
        .await;

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 10, "one progress event per unit");
        assert!(events.iter().all(|&(_, total)| total == 10));
        assert!(
            events.iter().any(|&(done, _)| done == 10),
            "the final event must report full completion"
        );
    }

    #[tokio::test]
    async fn a_failing_unit_does_not_stop_other_workers() {
        // Units record failures internally; simulate one that hits its
        // failure path immediately while the rest do real work
        let succeeded = Arc::new(AtomicUsize::new(0));
        let mut units: Vec<WorkUnit> = Vec::new();
        for i in 0..12 {
            let succeeded = succeeded.clone();
            units.push(
                async move {
                    if i != 5 {
                        tokio::time::sleep(Duration::from_millis(1)).await;
                        succeeded.fetch_add(1, Ordering::SeqCst);
                    }
                }
                .boxed(),
            );
        }

        run(units, 4, |_, _| {}).await;

        assert_eq!(
            succeeded.load(Ordering::SeqCst),
            11,
            "all non-failing units still complete"
        );
    }

    #[tokio::test]
    async fn empty_backlog_completes_without_progress_events() {
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = fired.clone();

        run(Vec::new(), 6, move |_, _| {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        })
        .await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn zero_concurrency_is_clamped_to_one_worker() {
        let ran = Arc::new(AtomicUsize::new(0));
        let ran_clone = ran.clone();
        let units: Vec<WorkUnit> = vec![
            {
                let ran = ran_clone.clone();
                async move {
                    ran.fetch_add(1, Ordering::SeqCst);
                }
                .boxed()
            },
            {
                let ran = ran_clone;
                async move {
                    ran.fetch_add(1, Ordering::SeqCst);
                }
                .boxed()
            },
        ];

        run(units, 0, |_, _| {}).await;

        assert_eq!(ran.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn uneven_unit_durations_keep_workers_busy() {
        // One slow unit must not serialize the rest: with 2 workers, the
        // nine fast units should finish while the slow one is still running,
        // so total wall time stays well under slow + 9 * fast
        let start = std::time::Instant::now();
        let mut units: Vec<WorkUnit> = vec![
            async {
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            .boxed(),
        ];
        for _ in 0..9 {
            units.push(
                async {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
                .boxed(),
            );
        }

        run(units, 2, |_, _| {}).await;

        let elapsed = start.elapsed();
        assert!(
            elapsed < Duration::from_millis(200),
            "shared backlog should overlap the slow unit with fast ones, took {elapsed:?}"
        );
    }
}
