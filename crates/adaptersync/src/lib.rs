//! Keep a device agent synchronized with its model's assignable adapters.
//!
//! Every hardware model's [`AssignableAdapters`] record is published on one
//! shared topic, keyed by model name. A [`ModelFilteredSubscription`] follows
//! exactly one of those keys and exposes the current record plus whether it
//! exists at all.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use adaptersync::{AssignableAdapters, FileModel, ModelFilteredSubscription, ModelSource};
//! use adaptersync_pubsub::Bus;
//!
//! let model = FileModel::new("/config/hardwaremodel").model()?;
//! let mut sub = ModelFilteredSubscription::<AssignableAdapters>::new(Arc::new(Bus::new()), model)?;
//!
//! loop {
//!     tokio::select! {
//!         Some(token) = sub.next_change() => {
//!             sub.process_change(token)?;
//!             if sub.found() {
//!                 println!("{} bundles", sub.record().io_bundle_list.len());
//!             }
//!         }
//!         // other sources ...
//!     }
//! }
//! ```

pub mod error;
pub mod model;
pub mod observer;
pub mod subscription;

pub use error::Error;
pub use model::{FileModel, ModelSource, StaticModel};
pub use observer::{NoopObserver, SubscriptionObserver, TracingObserver};
pub use subscription::{ModelFilteredSubscription, ModelStatus};

/// Re-export record types.
pub use adaptersync_proto::{AssignableAdapters, IoBundle, IoType, Topic};

/// Subscription to the assignable adapters of one model.
pub type AssignableAdaptersSubscription = ModelFilteredSubscription<AssignableAdapters>;
