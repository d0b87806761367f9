//! Persistent cell: an observable cell written through to a `KvStore`.

use crate::cell::{Cell, Observable, Subscriber, Subscription};
use orderdesk_core::KvStore;
use std::sync::Arc;

/// A `Cell` seeded from a `KvStore` at construction and written through on
/// every `set`.
///
/// Decoding is total: a missing or malformed stored value silently falls
/// back to the supplied default, never to an error.
pub struct CachedCell<T> {
    cell: Cell<T>,
    store: Arc<dyn KvStore>,
    key: Arc<str>,
    encode: Arc<dyn Fn(&T) -> String + Send + Sync>,
}

impl<T> Clone for CachedCell<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            store: Arc::clone(&self.store),
            key: Arc::clone(&self.key),
            encode: Arc::clone(&self.encode),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> CachedCell<T> {
    /// Create a cell under `key`, seeding from the store.
    ///
    /// `decode` returns `None` for values it cannot interpret; those seed
    /// the `default` instead.
    pub fn new(
        store: Arc<dyn KvStore>,
        key: &str,
        default: T,
        encode: impl Fn(&T) -> String + Send + Sync + 'static,
        decode: impl Fn(&str) -> Option<T>,
    ) -> Self {
        let initial = store
            .read(key)
            .and_then(|raw| decode(&raw))
            .unwrap_or(default);
        Self {
            cell: Cell::new(initial),
            store,
            key: key.into(),
            encode: Arc::new(encode),
        }
    }

    /// Write through to the store, then broadcast.
    pub fn set(&self, value: T) {
        self.store.write(&self.key, &(self.encode)(&value));
        self.cell.set(value);
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> for CachedCell<T> {
    fn get(&self) -> T {
        self.cell.get()
    }

    fn subscribe_with(&self, subscriber: Subscriber<T>) -> Subscription {
        self.cell.subscribe_with(subscriber)
    }
}

/// Persisted string cell; missing value seeds `default`.
pub fn cached_string(store: Arc<dyn KvStore>, key: &str, default: &str) -> CachedCell<String> {
    CachedCell::new(
        store,
        key,
        default.to_string(),
        |v| v.clone(),
        |raw| Some(raw.to_string()),
    )
}

/// Persisted optional string cell; `None` is stored as the empty string.
pub fn cached_string_optional(store: Arc<dyn KvStore>, key: &str) -> CachedCell<Option<String>> {
    CachedCell::new(
        store,
        key,
        None,
        |v| v.clone().unwrap_or_default(),
        |raw| {
            Some(if raw.is_empty() {
                None
            } else {
                Some(raw.to_string())
            })
        },
    )
}
