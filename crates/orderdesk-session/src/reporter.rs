//! Default error reporter.

use orderdesk_core::ErrorReporter;
use tracing::error;

/// Reports through the tracing pipeline.
///
/// A GUI host would swap in a toast/notification reporter; the session
/// only ever calls `report`.
#[derive(Debug, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, message: &str) {
        error!(target: "orderdesk::settings", "{message}");
    }
}
