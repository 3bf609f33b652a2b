//! Operator-visible notifications
//!
//! Phase completion, failure, and cancellation are surfaced as
//! one-line fire-and-forget messages through a [`Notifier`]. The CLI
//! prints them; embedders can route them anywhere. This is separate
//! from `tracing` diagnostics: a notification is something the
//! operator should see even with logging turned off.

/// One-line message channel for sync outcomes.
///
/// Fire-and-forget: implementations must not block and must not fail.
pub trait Notifier: Send + Sync {
    /// Deliver a single operator-visible message.
    fn notify(&self, message: &str);
}

/// Default notifier that forwards messages to `tracing::info!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        tracing::info!(target: "vaultsync::notify", "{message}");
    }
}
