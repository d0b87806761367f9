//! In-memory key-value store.

use dashmap::DashMap;
use orderdesk_core::KvStore;

/// Process-local store; nothing survives a restart.
///
/// Used by tests and by sessions that opt out of persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.clone())
    }

    fn write(&self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}
