//! Channel trait and wire types.

use crate::error::ChannelResult;
use edusync_core::Snapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The remote object-store identity under which devices exchange snapshots.
///
/// Opaque to everything but the store that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    /// Wraps a raw id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// The `{name, data}` body stored under a channel id.
///
/// `name` is a human-readable label for the object; `data` is the snapshot
/// payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteObject {
    /// Display label of the stored object.
    pub name: String,
    /// The snapshot payload.
    pub data: Snapshot,
}

/// A client for the remote object store a replica group syncs through.
///
/// This trait abstracts the store, allowing different implementations (the
/// HTTP protocol mapping, an in-memory double for tests). Implementations
/// must not retry internally: retry policy belongs to the sync engine, which
/// retries on its next scheduled tick.
pub trait RemoteChannel: Send + Sync {
    /// Fetches the snapshot currently stored under `id`.
    ///
    /// # Errors
    ///
    /// [`crate::ChannelError::NotFound`] when the channel has not been
    /// provisioned, [`crate::ChannelError::RateLimited`] when the store is
    /// throttling this client, or a transient transport/format error.
    fn fetch_snapshot(&self, id: &ChannelId) -> ChannelResult<Snapshot>;

    /// Replaces the snapshot stored under `id`.
    ///
    /// A plain last-writer-wins replace; the store offers no compare-and-swap.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`RemoteChannel::fetch_snapshot`].
    fn replace_snapshot(&self, id: &ChannelId, snapshot: &Snapshot) -> ChannelResult<()>;

    /// Creates a new channel holding `snapshot` and returns its id.
    ///
    /// # Errors
    ///
    /// [`crate::ChannelError::RateLimited`] or a transient transport/format
    /// error.
    fn create_channel(&self, snapshot: &Snapshot) -> ChannelResult<ChannelId>;
}

impl<T: RemoteChannel + ?Sized> RemoteChannel for std::sync::Arc<T> {
    fn fetch_snapshot(&self, id: &ChannelId) -> ChannelResult<Snapshot> {
        (**self).fetch_snapshot(id)
    }

    fn replace_snapshot(&self, id: &ChannelId, snapshot: &Snapshot) -> ChannelResult<()> {
        (**self).replace_snapshot(id, snapshot)
    }

    fn create_channel(&self, snapshot: &Snapshot) -> ChannelResult<ChannelId> {
        (**self).create_channel(snapshot)
    }
}
