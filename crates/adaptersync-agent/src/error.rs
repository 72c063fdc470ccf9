//! Agent error types.

use std::path::PathBuf;

use thiserror::Error;

/// Agent errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Subscription or model resolution error.
    #[error("adapter error: {0}")]
    Adapter(#[from] adaptersync::Error),

    /// Transport error.
    #[error("pubsub error: {0}")]
    PubSub(#[from] adaptersync_pubsub::Error),

    /// The seed file could not be read.
    #[error("failed to read seed file {path}: {source}")]
    SeedRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The seed file is not a JSON array of records.
    #[error("invalid seed file {path}: {source}")]
    SeedFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A seed record has no model name.
    #[error("seed record {index} has an empty model")]
    SeedModel { index: usize },
}
