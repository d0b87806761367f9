//! Observable cell: a value with subscriber notification on change.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Shared subscriber callback.
pub type Subscriber<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle detaching a subscriber when dropped.
///
/// Holds only a weak reference to the cell, so a forgotten subscription
/// never keeps a cell alive.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Detach the subscriber now instead of at drop.
    pub fn unsubscribe(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Read/subscribe surface shared by every cell flavor.
///
/// `subscribe` invokes the callback immediately with the current value,
/// then on every later broadcast. `on_change` skips the immediate call;
/// the session's cascade edges use it so that wiring the graph does not
/// count as an event.
pub trait Observable<T: Clone>: Clone + Send + Sync + 'static {
    fn get(&self) -> T;

    fn subscribe_with(&self, subscriber: Subscriber<T>) -> Subscription;

    fn subscribe(&self, f: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        self.subscribe_with(Arc::new(f))
    }

    fn on_change(&self, f: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let first = AtomicBool::new(true);
        self.subscribe(move |value| {
            if first.swap(false, Ordering::SeqCst) {
                return;
            }
            f(value)
        })
    }
}

struct CellShared<T> {
    value: Mutex<T>,
    subscribers: Mutex<Vec<(u64, Subscriber<T>)>>,
    next_id: AtomicU64,
}

/// Mutable observable value.
///
/// Cloning produces another handle to the same cell. Broadcast happens
/// after the value is stored and outside any internal lock, so a
/// subscriber may re-enter the cell (read it, set it, or set others).
pub struct Cell<T> {
    shared: Arc<CellShared<T>>,
}

impl<T> Clone for Cell<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Cell<T> {
    pub fn new(value: T) -> Self {
        Self {
            shared: Arc::new(CellShared {
                value: Mutex::new(value),
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Store `value` and synchronously notify all current subscribers.
    pub fn set(&self, value: T) {
        *self.shared.value.lock() = value.clone();
        self.broadcast(&value);
    }

    fn broadcast(&self, value: &T) {
        // Snapshot the subscriber list so handlers can subscribe or
        // unsubscribe mid-wave without holding the lock.
        let subscribers: Vec<Subscriber<T>> = self
            .shared
            .subscribers
            .lock()
            .iter()
            .map(|(_, s)| Arc::clone(s))
            .collect();
        for subscriber in subscribers {
            subscriber(value);
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> for Cell<T> {
    fn get(&self) -> T {
        self.shared.value.lock().clone()
    }

    fn subscribe_with(&self, subscriber: Subscriber<T>) -> Subscription {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        self.shared
            .subscribers
            .lock()
            .push((id, Arc::clone(&subscriber)));

        let current = self.get();
        subscriber(&current);

        let weak: Weak<CellShared<T>> = Arc::downgrade(&self.shared);
        Subscription::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.subscribers.lock().retain(|(sid, _)| *sid != id);
            }
        })
    }
}
