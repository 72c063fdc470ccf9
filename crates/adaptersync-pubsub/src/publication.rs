//! Typed publishers.

use std::marker::PhantomData;

use adaptersync_proto::Topic;
use serde::Serialize;

use crate::bus::Bus;
use crate::error::Error;

/// Publishes records of type `T` on their topic.
pub struct Publication<T> {
    bus: Bus,
    _record: PhantomData<fn(&T)>,
}

impl<T> Publication<T>
where
    T: Topic + Serialize,
{
    /// Create a publisher on `bus`.
    pub fn new(bus: Bus) -> Self {
        Self {
            bus,
            _record: PhantomData,
        }
    }

    /// Publish or replace the record under `key`.
    pub fn publish(&self, key: &str, record: &T) -> Result<(), Error> {
        let value = serde_json::to_value(record)?;
        self.bus.publish(T::TOPIC, key, value)
    }

    /// Retract the record under `key`.
    pub fn unpublish(&self, key: &str) -> Result<(), Error> {
        self.bus.unpublish(T::TOPIC, key)
    }

    /// Keys currently published for `T`.
    pub fn keys(&self) -> Vec<String> {
        self.bus.keys(T::TOPIC)
    }
}

impl<T> Clone for Publication<T> {
    fn clone(&self) -> Self {
        Self {
            bus: self.bus.clone(),
            _record: PhantomData,
        }
    }
}
