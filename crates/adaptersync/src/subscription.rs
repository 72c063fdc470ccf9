//! Subscription filtered to a single hardware model.

use adaptersync_proto::Topic;
use adaptersync_pubsub::{ChangeToken, SharedTransport, Subscription};
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::model::validate_model;
use crate::observer::{SubscriptionObserver, TracingObserver};

/// Whether a record for the model currently exists on the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStatus {
    NotFound,
    Found,
}

/// State the handlers operate on.
///
/// `found` implies `record` is the last value published for `model`; otherwise
/// `record` is `T::default()`.
struct ModelState<T> {
    model: String,
    found: bool,
    record: T,
    observer: Box<dyn SubscriptionObserver>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for ModelState<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelState")
            .field("model", &self.model)
            .field("found", &self.found)
            .field("record", &self.record)
            .finish()
    }
}

/// Tracks the one record of type `T` published under the device's model key.
///
/// The distribution channel carries every model's record; changes for other
/// keys are skipped. A retraction of the model's record resets [`record`](Self::record)
/// to `T::default()`.
///
/// The owner drains [`next_change`](Self::next_change) and passes each token to
/// [`process_change`](Self::process_change), reading [`record`](Self::record)
/// and [`found`](Self::found) in between.
pub struct ModelFilteredSubscription<T> {
    inner: Subscription<T, ModelState<T>>,
}

impl<T> ModelFilteredSubscription<T>
where
    T: Topic + DeserializeOwned + Clone + Default + 'static,
{
    /// Subscribe to `model`'s record, logging through `tracing`.
    pub fn new(transport: SharedTransport, model: impl Into<String>) -> Result<Self, Error> {
        Self::with_observer(transport, model, TracingObserver)
    }

    /// Subscribe to `model`'s record, reporting events to `observer`.
    ///
    /// Fails if the model key is empty or the transport cannot open or
    /// activate the subscription.
    pub fn with_observer(
        transport: SharedTransport,
        model: impl Into<String>,
        observer: impl SubscriptionObserver + 'static,
    ) -> Result<Self, Error> {
        let model = validate_model(model.into())?;
        let state = ModelState {
            model,
            found: false,
            record: T::default(),
            observer: Box::new(observer),
        };

        let mut inner = Subscription::open(transport, state)?;
        inner.on_modify(handle_modify::<T>);
        inner.on_delete(handle_delete::<T>);
        inner.activate()?;

        tracing::debug!(
            topic = T::TOPIC,
            model = %inner.context().model,
            feed_id = inner.feed_id(),
            "model subscription active"
        );
        Ok(Self { inner })
    }

    /// Wait for the next change token. `None` once the transport has gone away.
    pub async fn next_change(&mut self) -> Option<ChangeToken> {
        self.inner.next_change().await
    }

    /// Take the next change token if one is already queued.
    pub fn try_next_change(&mut self) -> Option<ChangeToken> {
        self.inner.try_next_change()
    }

    /// Apply one change token.
    ///
    /// A published record that does not decode as `T` is an error and leaves
    /// the current state untouched. A retraction of the model always clears
    /// it, whatever previous value the token carries.
    pub fn process_change(&mut self, token: ChangeToken) -> Result<(), Error> {
        self.inner.process_change(token)?;
        Ok(())
    }

    /// Apply every token already queued. Returns how many were applied.
    pub fn process_pending(&mut self) -> Result<usize, Error> {
        let mut applied = 0;
        while let Some(token) = self.inner.try_next_change() {
            self.process_change(token)?;
            applied += 1;
        }
        Ok(applied)
    }
}

impl<T> ModelFilteredSubscription<T> {
    /// The model key this subscription follows.
    pub fn model(&self) -> &str {
        &self.inner.context().model
    }

    /// Whether a record for the model currently exists.
    pub fn found(&self) -> bool {
        self.inner.context().found
    }

    pub fn status(&self) -> ModelStatus {
        if self.found() {
            ModelStatus::Found
        } else {
            ModelStatus::NotFound
        }
    }

    /// The model's record, or `T::default()` when not found.
    pub fn record(&self) -> &T {
        &self.inner.context().record
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ModelFilteredSubscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelFilteredSubscription")
            .field("state", self.inner.context())
            .finish()
    }
}

fn handle_modify<T: Clone>(state: &mut ModelState<T>, key: &str, record: &T) {
    if key != state.model {
        state.observer.key_ignored(key, &state.model);
        return;
    }
    state.record = record.clone();
    state.found = true;
    state.observer.record_found(&state.model);
}

fn handle_delete<T: Default>(state: &mut ModelState<T>, key: &str, _previous: Option<&T>) {
    if key != state.model {
        state.observer.key_ignored(key, &state.model);
        return;
    }
    let was_found = state.found;
    state.record = T::default();
    state.found = false;
    state.observer.record_cleared(&state.model, was_found);
}
