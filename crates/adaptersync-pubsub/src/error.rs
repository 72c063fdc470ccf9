//! Pub/sub error types.

use thiserror::Error;

/// Pub/sub errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The bus has been closed.
    #[error("bus is closed")]
    Closed,

    /// Empty topic name or key.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// Unpublish of a key that is not present.
    #[error("key {key} not found in topic {topic}")]
    NotFound { topic: String, key: String },

    /// Activation of a feed the transport does not know.
    #[error("unknown feed {feed_id} on topic {topic}")]
    UnknownFeed { topic: String, feed_id: u64 },

    /// A payload on the channel did not decode as the subscribed record type.
    #[error("malformed {topic} record for key {key}: {source}")]
    Decode {
        topic: &'static str,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Persistent store error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),
}
