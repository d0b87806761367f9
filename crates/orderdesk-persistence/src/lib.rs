//! Preference persistence for the orderdesk settings engine.
//!
//! Implements the `KvStore` collaborator two ways:
//! - `MemoryStore`: process-local, used by tests and ephemeral sessions
//! - `JsonFileStore`: a small JSON snapshot on disk, rewritten atomically
//!   on every write

pub mod error;
pub mod file;
pub mod memory;

pub use error::{PersistenceError, PersistenceResult};
pub use file::JsonFileStore;
pub use memory::MemoryStore;
