//! Selection resolution graph.
//!
//! `SettingsSession` owns the whole reactive graph for one application
//! session: the persisted settings text, the asynchronously parsed
//! document, the three persisted selection cells (network, orderbook,
//! deployment) and every derived view over them, plus the cascade-reset
//! edges that repair selections whenever the document changes underneath
//! them.

pub mod reporter;
pub mod session;

pub use reporter::TracingReporter;
pub use session::SettingsSession;
