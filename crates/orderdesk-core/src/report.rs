//! Error reporting collaborator.

/// Fire-and-forget sink for user-facing error messages.
///
/// The reactive core absorbs failures (parse errors settle to a fallback
/// document) and surfaces them only through this side channel.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, message: &str);
}
