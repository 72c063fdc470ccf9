//! Keyed publish/subscribe for adaptersync records.
//!
//! Records are published under a string key on the topic of their type.
//! Subscribers open a feed on the topic, register modify and delete handlers,
//! activate delivery and then feed each [`ChangeToken`] they receive back into
//! [`Subscription::process_change`].
//!
//! ```ignore
//! use std::sync::Arc;
//! use adaptersync_proto::AssignableAdapters;
//! use adaptersync_pubsub::{Bus, Publication, Subscription};
//!
//! let bus = Bus::new();
//! Publication::<AssignableAdapters>::new(bus.clone())
//!     .publish("model-a", &AssignableAdapters::new("model-a"))?;
//!
//! let mut sub = Subscription::<AssignableAdapters, Vec<String>>::open(Arc::new(bus), Vec::new())?;
//! sub.on_modify(|seen, key, _| seen.push(key.to_string()));
//! sub.activate()?;
//! while let Some(token) = sub.try_next_change() {
//!     sub.process_change(token)?;
//! }
//! ```

pub mod bus;
pub mod error;
pub mod publication;
pub mod subscription;
pub mod transport;

pub use bus::Bus;
pub use error::Error;
pub use publication::Publication;
pub use subscription::{ChangeHandler, DeleteHandler, Subscription};
pub use transport::{
    ChangeKind, ChangeReceiver, ChangeSender, ChangeToken, Feed, SharedTransport, Transport,
};
