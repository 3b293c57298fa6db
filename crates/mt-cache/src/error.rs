//! Error types for cached requests.

use mt_core::{SlotError, SourceError};
use thiserror::Error;

/// Errors raised while computing or caching a request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Deriving slots failed.
    #[error(transparent)]
    Slot(#[from] SlotError),

    /// A collaborator failed to answer a read.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The background computation panicked or was cancelled.
    #[error("background computation failed")]
    Join(#[from] tokio::task::JoinError),

    /// A computed value could not be converted to the cache payload.
    #[error("failed to encode cached value for {key}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
