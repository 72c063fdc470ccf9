//! Adapter error types.

use std::path::PathBuf;

use thiserror::Error;

/// Adapter errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Model key is empty.
    #[error("invalid model key: {0:?}")]
    InvalidModel(String),

    /// The model override file could not be read.
    #[error("failed to read model file {path}: {source}")]
    ModelFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Transport or decode error from the underlying subscription.
    #[error("pubsub error: {0}")]
    PubSub(#[from] adaptersync_pubsub::Error),
}
