//! Persistent key-value store collaborator.

/// String-keyed store backing persistent cells.
///
/// Keys are namespaced (e.g. `settings.activeNetworkRef`). Implementations
/// must never panic on malformed contents; callers treat an unreadable
/// value exactly like a missing one.
pub trait KvStore: Send + Sync {
    /// Read the stored value for `key`, if any.
    fn read(&self, key: &str) -> Option<String>;

    /// Write `value` under `key`. Failures are the implementation's
    /// problem (log and move on); persistence is best-effort and must not
    /// disturb in-memory state.
    fn write(&self, key: &str, value: &str);
}
