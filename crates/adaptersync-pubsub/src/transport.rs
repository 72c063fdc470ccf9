//! Transport interface consumed by subscriptions.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::Error;

/// Kind of change carried by a [`ChangeToken`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A key was published or updated.
    Modify,
    /// A key was retracted.
    Delete,
}

/// One change notification delivered on a feed.
///
/// Callers treat tokens as opaque and hand them back to
/// [`Subscription::process_change`](crate::Subscription::process_change).
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeToken {
    pub(crate) kind: ChangeKind,
    pub(crate) key: String,
    /// Current value for a modify, previous value for a delete.
    pub(crate) payload: Value,
}

impl ChangeToken {
    /// Token for a published or updated key.
    pub fn modify(key: impl Into<String>, value: Value) -> Self {
        Self {
            kind: ChangeKind::Modify,
            key: key.into(),
            payload: value,
        }
    }

    /// Token for a retracted key.
    pub fn delete(key: impl Into<String>, previous: Value) -> Self {
        Self {
            kind: ChangeKind::Delete,
            key: key.into(),
            payload: previous,
        }
    }

    /// Kind of change.
    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    /// Key the change applies to.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Sending half of a feed's notification channel.
pub type ChangeSender = mpsc::UnboundedSender<ChangeToken>;

/// Receiving half of a feed's notification channel.
pub type ChangeReceiver = mpsc::UnboundedReceiver<ChangeToken>;

/// A feed opened on a transport topic.
#[derive(Debug)]
pub struct Feed {
    /// Transport-assigned feed identifier.
    pub id: u64,
    /// Notification channel for this feed.
    pub changes: ChangeReceiver,
}

/// A keyed publish/subscribe transport.
///
/// Feeds receive nothing until activated. Tokens on a feed arrive in the
/// order the transport applied the changes to the topic.
pub trait Transport: Send + Sync {
    /// Open a feed on `topic`.
    fn open(&self, topic: &str) -> Result<Feed, Error>;

    /// Start delivery on a previously opened feed.
    fn activate(&self, topic: &str, feed_id: u64) -> Result<(), Error>;
}

/// Shared transport handle.
pub type SharedTransport = Arc<dyn Transport>;
