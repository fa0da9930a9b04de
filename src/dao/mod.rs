//! Persistence layer: the snapshot store abstraction and its backends.

use std::error::Error;
use thiserror::Error;

pub mod snapshot_store;

/// Result alias for snapshot store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by snapshot store backends regardless of the implementation.
///
/// The store is cache-like, so there is exactly one failure mode that
/// matters to callers: the backend cannot be reached. Sessions treat writes
/// as fire-and-forget and never surface this to the operator.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("snapshot store unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
