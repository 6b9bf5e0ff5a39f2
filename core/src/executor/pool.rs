use std::future::Future;
use std::sync::Mutex;

use futures::future::join_all;

/// Apply `mapper` to every item with at most `max_concurrency` calls in flight.
///
/// A fixed set of `max(1, min(N, max_concurrency))` workers pull the next unclaimed
/// index from a shared cursor. Results come back in input order whatever order the
/// mappers finish in. Nothing is retried here.
pub async fn map_with_concurrency<T, O, F, Fut>(
    items: Vec<T>,
    max_concurrency: usize,
    mapper: F,
) -> Vec<O>
where
    F: Fn(T, usize) -> Fut,
    Fut: Future<Output = O>,
{
    let total = items.len();
    if total == 0 {
        return Vec::new();
    }

    let worker_count = max_concurrency.min(total).max(1);
    let cursor = Mutex::new(items.into_iter().enumerate());
    let cursor = &cursor;
    let mapper = &mapper;

    let workers = (0..worker_count).map(|_| async move {
        let mut done = Vec::new();
        loop {
            let next = cursor.lock().unwrap_or_else(|e| e.into_inner()).next();
            let Some((index, item)) = next else {
                break;
            };
            done.push((index, mapper(item, index).await));
        }
        done
    });

    let mut slots: Vec<Option<O>> = (0..total).map(|_| None).collect();
    for (index, out) in join_all(workers).await.into_iter().flatten() {
        slots[index] = Some(out);
    }
    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct InFlight {
        current: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl InFlight {
        fn new() -> Self {
            Self {
                current: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
            }
        }

        async fn track<O>(&self, fut: impl Future<Output = O>) -> O {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            let out = fut.await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            out
        }
    }

    #[tokio::test]
    async fn preserves_input_order_under_uneven_latency() {
        let items: Vec<u64> = (0..10).collect();
        let out = map_with_concurrency(items, 3, |item, index| async move {
            // later items finish first
            tokio::time::sleep(Duration::from_millis(30 - item * 3)).await;
            (index, item * 10)
        })
        .await;

        let expected: Vec<(usize, u64)> = (0..10).map(|i| (i as usize, i * 10)).collect();
        assert_eq!(out, expected);
    }

    #[tokio::test]
    async fn never_exceeds_the_limit() {
        let tracker = InFlight::new();
        let out = map_with_concurrency((0..12).collect::<Vec<u32>>(), 4, |item, _| {
            tracker.track(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                item + 1
            })
        })
        .await;

        assert_eq!(out.len(), 12);
        assert_eq!(tracker.calls.load(Ordering::SeqCst), 12);
        assert_eq!(tracker.peak.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn limit_is_clamped_to_item_count_and_at_least_one() {
        let tracker = InFlight::new();
        map_with_concurrency(vec![1, 2], 8, |item, _| {
            tracker.track(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                item
            })
        })
        .await;
        assert_eq!(tracker.peak.load(Ordering::SeqCst), 2);

        let serial = InFlight::new();
        let out = map_with_concurrency(vec!["a", "b", "c"], 0, |item, _| {
            serial.track(async move {
                tokio::time::sleep(Duration::from_millis(2)).await;
                item.to_uppercase()
            })
        })
        .await;
        assert_eq!(out, vec!["A", "B", "C"]);
        assert_eq!(serial.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_input_never_calls_the_mapper() {
        let calls = AtomicUsize::new(0);
        let out: Vec<u8> = map_with_concurrency(Vec::<u8>::new(), 4, |item, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { item }
        })
        .await;
        assert!(out.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
