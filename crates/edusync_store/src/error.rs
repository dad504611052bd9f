//! Error types for local stores.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in a local store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// An underlying I/O operation failed.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The key is not usable by this store.
    #[error("invalid store key {key:?}: {reason}")]
    InvalidKey {
        /// The offending key.
        key: String,
        /// Why the key was rejected.
        reason: &'static str,
    },
}
