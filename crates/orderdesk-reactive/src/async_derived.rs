//! Async derived cells: derivations whose recompute suspends.
//!
//! Reading never blocks; `get` returns the latest settled value (or the
//! initial value before anything has settled). Callers that need the
//! settled result await `load`. A failed computation settles to the
//! configured fallback after reporting the error, so downstream cells
//! always stay well-defined.

use crate::cell::{Cell, Observable, Subscriber, Subscription};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::trace;

/// Reduce a computation result to the value to settle.
///
/// `Err` reports through `on_error` and yields the fallback. Pure apart
/// from the report callback, so the fallback-and-report policy is testable
/// without any cell plumbing.
pub fn settle_result<T: Clone, E>(
    result: Result<T, E>,
    fallback: &T,
    on_error: impl FnOnce(&E),
) -> T {
    match result {
        Ok(value) => value,
        Err(error) => {
            on_error(&error);
            fallback.clone()
        }
    }
}

/// Settling machinery shared by every launch of one derivation.
struct AsyncCore<T, E> {
    cell: Cell<T>,
    /// Generation of the most recently launched computation.
    generation: Arc<AtomicU64>,
    /// Highest generation that has settled.
    settled_tx: Arc<watch::Sender<u64>>,
    /// Serializes the stale-check-then-set step across worker threads.
    settle_lock: Arc<Mutex<()>>,
    fallback: T,
    on_error: Arc<dyn Fn(&E) + Send + Sync>,
}

impl<T: Clone, E> Clone for AsyncCore<T, E> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            generation: Arc::clone(&self.generation),
            settled_tx: Arc::clone(&self.settled_tx),
            settle_lock: Arc::clone(&self.settle_lock),
            fallback: self.fallback.clone(),
            on_error: Arc::clone(&self.on_error),
        }
    }
}

impl<T, E> AsyncCore<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    /// Launch one computation generation.
    ///
    /// The generation is claimed synchronously (before any await), so a
    /// `load` issued right after the triggering `set` observes the new
    /// in-flight computation. A superseded computation still runs to
    /// completion and still reports its error; only its value is dropped.
    fn launch<Fut>(&self, fut: Fut)
    where
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let core = self.clone();
        tokio::spawn(async move {
            let result = fut.await;
            let value = settle_result(result, &core.fallback, |e| (core.on_error)(e));
            {
                let _guard = core.settle_lock.lock();
                if core.generation.load(Ordering::SeqCst) == generation {
                    core.cell.set(value);
                } else {
                    trace!(generation, "discarding superseded async result");
                }
            }
            core.settled_tx.send_if_modified(|latest| {
                if generation > *latest {
                    *latest = generation;
                    true
                } else {
                    false
                }
            });
        });
    }
}

/// Read-only cell computed asynchronously from its sources.
///
/// Construction wires the source subscriptions but does not compute;
/// `refresh` launches the first computation. Callers kick it once their
/// own subscribers are attached, so nobody can miss the first settle.
pub struct AsyncDerived<T> {
    cell: Cell<T>,
    generation: Arc<AtomicU64>,
    settled_rx: watch::Receiver<u64>,
    relaunch: Arc<dyn Fn() + Send + Sync>,
    _sources: Arc<Vec<Subscription>>,
}

impl<T> Clone for AsyncDerived<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            generation: Arc::clone(&self.generation),
            settled_rx: self.settled_rx.clone(),
            relaunch: Arc::clone(&self.relaunch),
            _sources: Arc::clone(&self._sources),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> AsyncDerived<T> {
    /// Launch a computation from the current source values.
    pub fn refresh(&self) {
        (self.relaunch)();
    }

    /// Wait until every computation in flight at call time has settled,
    /// then return the value.
    pub async fn load(&self) -> T {
        let target = self.generation.load(Ordering::SeqCst);
        let mut settled = self.settled_rx.clone();
        loop {
            if *settled.borrow_and_update() >= target {
                break;
            }
            if settled.changed().await.is_err() {
                break;
            }
        }
        self.cell.get()
    }

    /// True while a computation is in flight.
    pub fn is_loading(&self) -> bool {
        *self.settled_rx.borrow() < self.generation.load(Ordering::SeqCst)
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> for AsyncDerived<T> {
    fn get(&self) -> T {
        self.cell.get()
    }

    fn subscribe_with(&self, subscriber: Subscriber<T>) -> Subscription {
        self.cell.subscribe_with(subscriber)
    }
}

/// Async derivation of a single source.
///
/// `initial` is exposed until the first computation settles; `fallback`
/// replaces the value of any failed computation. Nothing runs until the
/// source changes or `refresh` is called; computations spawn on the tokio
/// runtime current at that point.
pub fn async_derived<A, T, E, F, Fut>(
    source: &impl Observable<A>,
    initial: T,
    fallback: T,
    compute: F,
    on_error: impl Fn(&E) + Send + Sync + 'static,
) -> AsyncDerived<T>
where
    A: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    E: Send + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let source = source.clone();
    let cell = Cell::new(initial);
    let generation = Arc::new(AtomicU64::new(0));
    let (settled_tx, settled_rx) = watch::channel(0u64);
    let core = AsyncCore {
        cell: cell.clone(),
        generation: Arc::clone(&generation),
        settled_tx: Arc::new(settled_tx),
        settle_lock: Arc::new(Mutex::new(())),
        fallback,
        on_error: Arc::new(on_error),
    };

    let relaunch: Arc<dyn Fn() + Send + Sync> = {
        let (source, core, compute) = (source.clone(), core, Arc::new(compute));
        Arc::new(move || core.launch(compute(source.get())))
    };
    let sub = {
        let relaunch = Arc::clone(&relaunch);
        source.on_change(move |_| relaunch())
    };

    AsyncDerived {
        cell,
        generation,
        settled_rx,
        relaunch,
        _sources: Arc::new(vec![sub]),
    }
}

/// Async derivation of two sources.
pub fn async_derived2<A, B, T, E, F, Fut>(
    a: &impl Observable<A>,
    b: &impl Observable<B>,
    initial: T,
    fallback: T,
    compute: F,
    on_error: impl Fn(&E) + Send + Sync + 'static,
) -> AsyncDerived<T>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    E: Send + 'static,
    F: Fn(A, B) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let (a, b) = (a.clone(), b.clone());
    let cell = Cell::new(initial);
    let generation = Arc::new(AtomicU64::new(0));
    let (settled_tx, settled_rx) = watch::channel(0u64);
    let core = AsyncCore {
        cell: cell.clone(),
        generation: Arc::clone(&generation),
        settled_tx: Arc::new(settled_tx),
        settle_lock: Arc::new(Mutex::new(())),
        fallback,
        on_error: Arc::new(on_error),
    };
    let compute = Arc::new(compute);

    let relaunch: Arc<dyn Fn() + Send + Sync> = {
        let (a, b, core, compute) = (a.clone(), b.clone(), core, Arc::clone(&compute));
        Arc::new(move || core.launch(compute(a.get(), b.get())))
    };
    let subs = vec![
        {
            let relaunch = Arc::clone(&relaunch);
            a.on_change(move |_| relaunch())
        },
        {
            let relaunch = Arc::clone(&relaunch);
            b.on_change(move |_| relaunch())
        },
    ];

    AsyncDerived {
        cell,
        generation,
        settled_rx,
        relaunch,
        _sources: Arc::new(subs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::Notify;

    #[tokio::test]
    async fn exposes_initial_until_first_settle() {
        let source = Cell::new(1u32);
        let gate = Arc::new(Notify::new());
        let doubled = {
            let gate = Arc::clone(&gate);
            async_derived(
                &source,
                0u32,
                0u32,
                move |v: u32| {
                    let gate = Arc::clone(&gate);
                    async move {
                        gate.notified().await;
                        Ok::<_, String>(v * 2)
                    }
                },
                |_e: &String| {},
            )
        };

        // Idle until kicked.
        assert_eq!(doubled.get(), 0);
        assert!(!doubled.is_loading());

        doubled.refresh();
        assert!(doubled.is_loading());
        assert_eq!(doubled.get(), 0);
        gate.notify_one();
        assert_eq!(doubled.load().await, 2);
        assert!(!doubled.is_loading());
    }

    #[tokio::test]
    async fn subscribers_wired_before_refresh_observe_the_first_settle() {
        let source = Cell::new(3u32);
        let doubled = async_derived(
            &source,
            0u32,
            0u32,
            |v: u32| async move { Ok::<_, String>(v * 2) },
            |_e: &String| {},
        );

        let seen = Arc::new(Mutex::new(Vec::new()));
        let _sub = {
            let seen = Arc::clone(&seen);
            doubled.on_change(move |v: &u32| seen.lock().push(*v))
        };

        doubled.refresh();
        assert_eq!(doubled.load().await, 6);
        assert_eq!(*seen.lock(), vec![6]);
    }

    #[tokio::test]
    async fn failure_settles_fallback_and_reports_once() {
        let source = Cell::new("bad".to_string());
        let reports = Arc::new(AtomicUsize::new(0));
        let value = {
            let reports = Arc::clone(&reports);
            async_derived(
                &source,
                "initial".to_string(),
                "fallback".to_string(),
                |_text: String| async move { Err::<String, _>("parse failed".to_string()) },
                move |_e| {
                    reports.fetch_add(1, Ordering::SeqCst);
                },
            )
        };

        value.refresh();
        assert_eq!(value.load().await, "fallback");
        assert_eq!(reports.load(Ordering::SeqCst), 1);

        source.set("still bad".to_string());
        assert_eq!(value.load().await, "fallback");
        assert_eq!(reports.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn superseded_result_is_discarded() {
        let source = Cell::new("slow".to_string());
        let release_slow = Arc::new(Notify::new());
        let value = {
            let release_slow = Arc::clone(&release_slow);
            async_derived(
                &source,
                String::new(),
                String::new(),
                move |text: String| {
                    let release_slow = Arc::clone(&release_slow);
                    async move {
                        if text == "slow" {
                            release_slow.notified().await;
                        }
                        Ok::<_, String>(format!("{text}-result"))
                    }
                },
                |_e: &String| {},
            )
        };

        value.refresh();

        // Second launch supersedes the first and settles immediately.
        source.set("fast".to_string());
        assert_eq!(value.load().await, "fast-result");

        // Let the stale computation finish; its value must not win.
        release_slow.notify_one();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(value.get(), "fast-result");
    }

    #[tokio::test]
    async fn derives_from_two_sources() {
        let left = Cell::new(2u32);
        let right = Cell::new(3u32);
        let product = async_derived2(
            &left,
            &right,
            0u32,
            0u32,
            |a: u32, b: u32| async move { Ok::<_, String>(a * b) },
            |_e: &String| {},
        );
        product.refresh();
        assert_eq!(product.load().await, 6);
        right.set(10);
        assert_eq!(product.load().await, 20);
    }

    #[test]
    fn settle_result_is_a_pure_reducer() {
        let fallback = "empty".to_string();
        let mut reported = None;
        let ok = settle_result(Ok::<_, String>("doc".to_string()), &fallback, |_| {});
        assert_eq!(ok, "doc");
        let err = settle_result(Err::<String, _>("boom".to_string()), &fallback, |e| {
            reported = Some(e.clone())
        });
        assert_eq!(err, "empty");
        assert_eq!(reported.as_deref(), Some("boom"));
    }
}
