//! JSON snapshot file store.
//!
//! Preferences are a handful of short strings, so the whole store is
//! rewritten as one JSON snapshot per write. Writes go to a temp file
//! first and rename over the target, so a crash mid-write leaves the
//! previous snapshot intact.

use crate::error::PersistenceResult;
use chrono::{DateTime, Utc};
use orderdesk_core::KvStore;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

/// File-backed `KvStore`.
///
/// A missing or malformed snapshot file starts the store empty; write
/// failures are logged and the in-memory view stays authoritative for the
/// rest of the session.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open the store at `path`, loading any existing snapshot.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(?e, path = %path.display(), "failed to create state directory");
            }
        }

        let entries = match Self::load(&path) {
            Ok(snapshot) => snapshot.entries,
            Err(e) => {
                if path.exists() {
                    warn!(?e, path = %path.display(), "unreadable preference snapshot, starting empty");
                }
                BTreeMap::new()
            }
        };

        debug!(path = %path.display(), keys = entries.len(), "opened preference store");
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn load(path: &Path) -> PersistenceResult<Snapshot> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> PersistenceResult<()> {
        let snapshot = Snapshot {
            saved_at: Some(Utc::now()),
            entries: entries.clone(),
        };
        let raw = serde_json::to_string_pretty(&snapshot)?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KvStore for JsonFileStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist(&entries) {
            warn!(?e, path = %self.path.display(), "failed to persist preferences");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static UNIQUE: AtomicU64 = AtomicU64::new(0);

    fn temp_path() -> PathBuf {
        let n = UNIQUE.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!(
            "orderdesk-prefs-test-{}-{n}/prefs.json",
            std::process::id()
        ))
    }

    #[test]
    fn values_survive_reopen() {
        let path = temp_path();
        {
            let store = JsonFileStore::open(&path);
            store.write("settings.activeNetworkRef", "polygon");
            store.write("settings", "networks: {}");
        }
        let reopened = JsonFileStore::open(&path);
        assert_eq!(
            reopened.read("settings.activeNetworkRef").as_deref(),
            Some("polygon")
        );
        assert_eq!(reopened.read("settings").as_deref(), Some("networks: {}"));
    }

    #[test]
    fn malformed_snapshot_starts_empty() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ this is not json").unwrap();

        let store = JsonFileStore::open(&path);
        assert_eq!(store.read("settings"), None);

        // The store stays usable despite the bad snapshot.
        store.write("settings", "x");
        assert_eq!(store.read("settings").as_deref(), Some("x"));
    }

    #[test]
    fn missing_file_reads_none() {
        let store = JsonFileStore::open(temp_path());
        assert_eq!(store.read("anything"), None);
    }
}
