//! Observation hooks for filtered subscriptions.

/// Receives notable events from a [`ModelFilteredSubscription`](crate::ModelFilteredSubscription).
///
/// All methods default to doing nothing.
pub trait SubscriptionObserver: Send {
    /// A record for the model was published or replaced.
    fn record_found(&self, _model: &str) {}

    /// The record for the model was retracted.
    fn record_cleared(&self, _model: &str, _was_found: bool) {}

    /// A change for a different model was skipped.
    fn key_ignored(&self, _key: &str, _model: &str) {}
}

/// Emits `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SubscriptionObserver for TracingObserver {
    fn record_found(&self, model: &str) {
        tracing::info!(model, "assignable adapters found");
    }

    fn record_cleared(&self, model: &str, was_found: bool) {
        tracing::info!(model, was_found, "assignable adapters cleared");
    }

    fn key_ignored(&self, key: &str, model: &str) {
        tracing::debug!(key, expecting = model, "ignoring change for other model");
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SubscriptionObserver for NoopObserver {}
