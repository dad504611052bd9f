//! Error types for remote channel operations.

use thiserror::Error;

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors that can occur talking to the remote object store.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// The channel id has no object behind it (HTTP 404).
    #[error("channel not found")]
    NotFound,

    /// The store is throttling this client (HTTP 429).
    ///
    /// Not retryable against the same channel: the engine stops automatic
    /// traffic and waits for an explicit re-provision.
    #[error("remote store is rate limiting this client")]
    RateLimited,

    /// The request never completed (connection refused, timeout, DNS).
    ///
    /// Always transient: retried on the engine's next scheduled tick.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body was not a valid snapshot object.
    #[error("malformed remote object: {0}")]
    Format(#[from] serde_json::Error),

    /// The store answered with a status the protocol does not define.
    #[error("unexpected HTTP status {0}")]
    Status(u16),
}

impl ChannelError {
    /// Returns true if the next scheduled tick may succeed without operator
    /// intervention.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ChannelError::Transport(_) | ChannelError::Status(_) | ChannelError::Format(_)
        )
    }
}
