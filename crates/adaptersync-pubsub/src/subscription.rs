//! Typed subscriptions over a transport topic.

use std::marker::PhantomData;

use adaptersync_proto::Topic;
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::transport::{ChangeKind, ChangeReceiver, ChangeToken, SharedTransport};

/// Handler invoked with the subscription context, the key and the record.
pub type ChangeHandler<T, C> = Box<dyn FnMut(&mut C, &str, &T) + Send>;

/// Handler invoked for a retracted key. The previous value is `None` when the
/// token carried none or it did not decode as `T`.
pub type DeleteHandler<T, C> = Box<dyn FnMut(&mut C, &str, Option<&T>) + Send>;

/// A subscription to every key of the topic of record type `T`.
///
/// The subscription owns a context `C` that its handlers receive by mutable
/// reference, so handlers never need shared or untyped state. Tokens drained
/// from [`next_change`](Self::next_change) are handed back to
/// [`process_change`](Self::process_change), which decodes the payload and
/// runs the matching handler before returning.
pub struct Subscription<T, C> {
    transport: SharedTransport,
    feed_id: u64,
    changes: ChangeReceiver,
    context: C,
    modify_handler: Option<ChangeHandler<T, C>>,
    delete_handler: Option<DeleteHandler<T, C>>,
    activated: bool,
    _record: PhantomData<fn() -> T>,
}

impl<T, C> Subscription<T, C>
where
    T: Topic + DeserializeOwned,
{
    /// Open a subscription on `T`'s topic. Delivery starts at [`activate`](Self::activate).
    pub fn open(transport: SharedTransport, context: C) -> Result<Self, Error> {
        let feed = transport.open(T::TOPIC)?;
        Ok(Self {
            transport,
            feed_id: feed.id,
            changes: feed.changes,
            context,
            modify_handler: None,
            delete_handler: None,
            activated: false,
            _record: PhantomData,
        })
    }

    /// Set the handler for published or updated keys.
    pub fn on_modify<F>(&mut self, handler: F)
    where
        F: FnMut(&mut C, &str, &T) + Send + 'static,
    {
        self.modify_handler = Some(Box::new(handler));
    }

    /// Set the handler for retracted keys. It receives the previous value
    /// when one could be decoded.
    pub fn on_delete<F>(&mut self, handler: F)
    where
        F: FnMut(&mut C, &str, Option<&T>) + Send + 'static,
    {
        self.delete_handler = Some(Box::new(handler));
    }

    /// Start delivery. Existing keys arrive first as modifies.
    pub fn activate(&mut self) -> Result<(), Error> {
        if self.activated {
            return Ok(());
        }
        self.transport.activate(T::TOPIC, self.feed_id)?;
        self.activated = true;
        Ok(())
    }

    /// Whether delivery has started.
    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Wait for the next change token. `None` once the transport has gone away.
    pub async fn next_change(&mut self) -> Option<ChangeToken> {
        self.changes.recv().await
    }

    /// Take the next change token if one is already queued.
    pub fn try_next_change(&mut self) -> Option<ChangeToken> {
        self.changes.try_recv().ok()
    }

    /// Decode one token and run the matching handler.
    ///
    /// A modify payload that does not decode as `T` returns [`Error::Decode`]
    /// without running any handler. Deletes always reach their handler.
    pub fn process_change(&mut self, token: ChangeToken) -> Result<(), Error> {
        let ChangeToken { kind, key, payload } = token;
        match kind {
            ChangeKind::Modify => {
                let record: T =
                    serde_json::from_value(payload).map_err(|source| Error::Decode {
                        topic: T::TOPIC,
                        key: key.clone(),
                        source,
                    })?;
                match self.modify_handler.as_mut() {
                    Some(handler) => handler(&mut self.context, &key, &record),
                    None => tracing::trace!(topic = T::TOPIC, key = %key, ?kind, "no handler registered"),
                }
            }
            ChangeKind::Delete => {
                let previous = match serde_json::from_value::<T>(payload) {
                    Ok(previous) => Some(previous),
                    Err(err) => {
                        tracing::debug!(topic = T::TOPIC, key = %key, error = %err, "previous value not decodable");
                        None
                    }
                };
                match self.delete_handler.as_mut() {
                    Some(handler) => handler(&mut self.context, &key, previous.as_ref()),
                    None => tracing::trace!(topic = T::TOPIC, key = %key, ?kind, "no handler registered"),
                }
            }
        }
        Ok(())
    }
}

impl<T, C> Subscription<T, C> {
    /// The subscription context.
    pub fn context(&self) -> &C {
        &self.context
    }

    /// Transport-assigned feed identifier.
    pub fn feed_id(&self) -> u64 {
        self.feed_id
    }
}

impl<T, C: std::fmt::Debug> std::fmt::Debug for Subscription<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("feed_id", &self.feed_id)
            .field("activated", &self.activated)
            .field("context", &self.context)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use adaptersync_proto::AssignableAdapters;
    use serde_json::json;

    use super::*;
    use crate::{Bus, Publication};

    #[derive(Debug, Default)]
    struct Seen {
        modified: Vec<String>,
        deleted: Vec<String>,
    }

    fn open(bus: &Bus) -> Subscription<AssignableAdapters, Seen> {
        let mut sub = Subscription::open(Arc::new(bus.clone()), Seen::default()).unwrap();
        sub.on_modify(|seen: &mut Seen, key: &str, _: &AssignableAdapters| {
            seen.modified.push(key.to_string())
        });
        sub.on_delete(|seen: &mut Seen, key: &str, _: Option<&AssignableAdapters>| {
            seen.deleted.push(key.to_string())
        });
        sub
    }

    fn drain(sub: &mut Subscription<AssignableAdapters, Seen>) {
        while let Some(token) = sub.try_next_change() {
            sub.process_change(token).unwrap();
        }
    }

    #[test]
    fn test_dispatch_to_handlers() {
        let bus = Bus::new();
        let publication = Publication::<AssignableAdapters>::new(bus.clone());
        publication.publish("m1", &AssignableAdapters::new("m1")).unwrap();

        let mut sub = open(&bus);
        sub.activate().unwrap();
        assert!(sub.is_activated());

        publication.publish("m2", &AssignableAdapters::new("m2")).unwrap();
        publication.unpublish("m1").unwrap();
        drain(&mut sub);

        assert_eq!(sub.context().modified, vec!["m1", "m2"]);
        assert_eq!(sub.context().deleted, vec!["m1"]);
    }

    #[test]
    fn test_malformed_payload_is_rejected() {
        let bus = Bus::new();
        let mut sub = open(&bus);
        sub.activate().unwrap();

        bus.publish("AssignableAdapters", "m1", json!({"IoBundleList": "nope"}))
            .unwrap();
        let token = sub.try_next_change().unwrap();
        let err = sub.process_change(token).unwrap_err();

        assert!(matches!(err, Error::Decode { key, .. } if key == "m1"));
        assert!(sub.context().modified.is_empty());
    }

    #[test]
    fn test_delete_without_previous_value_runs_handler() {
        let bus = Bus::new();
        let mut sub = open(&bus);

        sub.process_change(ChangeToken::delete("m1", json!(null)))
            .unwrap();
        sub.process_change(ChangeToken::delete("m2", json!({"IoBundleList": "nope"})))
            .unwrap();

        assert_eq!(sub.context().deleted, vec!["m1", "m2"]);
    }

    #[test]
    fn test_missing_handler_is_noop() {
        let bus = Bus::new();
        let mut sub: Subscription<AssignableAdapters, ()> =
            Subscription::open(Arc::new(bus.clone()), ()).unwrap();
        sub.activate().unwrap();

        Publication::<AssignableAdapters>::new(bus)
            .publish("m1", &AssignableAdapters::new("m1"))
            .unwrap();
        let token = sub.try_next_change().unwrap();
        assert!(sub.process_change(token).is_ok());
    }

    #[test]
    fn test_open_on_closed_bus_fails() {
        let bus = Bus::new();
        bus.close();
        let result = Subscription::<AssignableAdapters, ()>::open(Arc::new(bus), ());
        assert!(matches!(result, Err(Error::Closed)));
    }

    #[tokio::test]
    async fn test_next_change_ends_when_bus_closes() {
        let bus = Bus::new();
        let mut sub = open(&bus);
        sub.activate().unwrap();

        bus.close();
        assert!(sub.next_change().await.is_none());
    }
}
