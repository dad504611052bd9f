//! Error types for the sync engine and action pipeline.

use edusync_store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
///
/// These stay inside the engine and its direct callers (CLI commands, the
/// scheduler); the action pipeline never leaks them. Callers of the pipeline
/// observe status flags and [`ActionError`] only.
#[derive(Error, Debug)]
pub enum SyncError {
    /// No channel id is configured or adopted yet.
    #[error("no remote channel provisioned")]
    NotProvisioned,

    /// The remote store is throttling this channel.
    ///
    /// Automatic traffic stops; the one recovery action is provisioning a
    /// fresh channel.
    #[error("remote store is rate limiting this channel")]
    RateLimited,

    /// The remote store was unreachable; the device keeps working locally.
    #[error("remote store unreachable: {0}")]
    Offline(String),

    /// The remote object could not be parsed as a snapshot.
    #[error("malformed remote snapshot: {0}")]
    RemoteFormat(String),

    /// Local persistence failed.
    #[error("local store error: {0}")]
    Store(#[from] StoreError),

    /// Snapshot serialization failed.
    #[error("snapshot codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The result of an in-flight call was discarded because the channel
    /// identity changed underneath it.
    #[error("sync cycle cancelled")]
    Cancelled,
}

impl SyncError {
    /// Returns true if the next scheduled tick may succeed on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Offline(_) | SyncError::RemoteFormat(_))
    }
}

/// Rejections surfaced by action-pipeline mutations.
///
/// The only error type UI callers ever see; remote failures degrade to
/// status flags instead.
#[derive(Error, Debug)]
pub enum ActionError {
    /// The username already exists in the freshly merged snapshot.
    #[error("username {0:?} is already taken")]
    UsernameTaken(String),

    /// No such user.
    #[error("unknown user {0:?}")]
    UnknownUser(String),

    /// No such course.
    #[error("unknown course {0:?}")]
    UnknownCourse(String),

    /// No such task.
    #[error("unknown task {0:?}")]
    UnknownTask(String),

    /// No such submission.
    #[error("unknown submission {0:?}")]
    UnknownSubmission(String),

    /// Username/password pair did not match a stored account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The imported data was not a valid snapshot; state is unchanged.
    #[error("invalid import: {0}")]
    InvalidImport(String),

    /// The local store rejected the write.
    #[error("local persistence failed: {0}")]
    Storage(String),
}
