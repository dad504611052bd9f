//! In-memory channel store for tests.

use crate::client::{ChannelId, RemoteChannel, RemoteObject};
use crate::error::{ChannelError, ChannelResult};
use edusync_core::Snapshot;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// An in-memory object store shared by multiple engines under test.
///
/// Behaves like the real store (no locking, last write wins) and adds fault
/// injection: [`set_offline`](MemoryChannel::set_offline) makes every call a
/// transport error, [`set_rate_limited`](MemoryChannel::set_rate_limited)
/// makes every call answer 429. Write counters let tests assert that echo
/// suppression issued no redundant writes.
#[derive(Debug, Default)]
pub struct MemoryChannel {
    objects: RwLock<HashMap<ChannelId, RemoteObject>>,
    offline: AtomicBool,
    rate_limited: AtomicBool,
    fetches: AtomicU64,
    writes: AtomicU64,
    creates: AtomicU64,
}

impl MemoryChannel {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an object under a known id.
    pub fn insert(&self, id: ChannelId, snapshot: Snapshot) {
        self.objects.write().insert(
            id,
            RemoteObject {
                name: "EduSync_Global_DB".to_string(),
                data: snapshot,
            },
        );
    }

    /// Returns the snapshot currently stored under `id`, if any.
    pub fn stored(&self, id: &ChannelId) -> Option<Snapshot> {
        self.objects.read().get(id).map(|o| o.data.clone())
    }

    /// Makes every subsequent call fail as a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Makes every subsequent call answer 429.
    pub fn set_rate_limited(&self, limited: bool) {
        self.rate_limited.store(limited, Ordering::SeqCst);
    }

    /// Number of successful fetches served.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of successful replaces applied.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of channels created.
    pub fn create_count(&self) -> u64 {
        self.creates.load(Ordering::SeqCst)
    }

    fn check_faults(&self) -> ChannelResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ChannelError::Transport("injected: offline".to_string()));
        }
        if self.rate_limited.load(Ordering::SeqCst) {
            return Err(ChannelError::RateLimited);
        }
        Ok(())
    }
}

impl RemoteChannel for MemoryChannel {
    fn fetch_snapshot(&self, id: &ChannelId) -> ChannelResult<Snapshot> {
        self.check_faults()?;
        let objects = self.objects.read();
        let object = objects.get(id).ok_or(ChannelError::NotFound)?;
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(object.data.clone())
    }

    fn replace_snapshot(&self, id: &ChannelId, snapshot: &Snapshot) -> ChannelResult<()> {
        self.check_faults()?;
        let mut objects = self.objects.write();
        let object = objects.get_mut(id).ok_or(ChannelError::NotFound)?;
        object.data = snapshot.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn create_channel(&self, snapshot: &Snapshot) -> ChannelResult<ChannelId> {
        self.check_faults()?;
        let id = ChannelId::new(uuid::Uuid::new_v4().to_string());
        self.objects.write().insert(
            id.clone(),
            RemoteObject {
                name: "EduSync_Global_DB".to_string(),
                data: snapshot.clone(),
            },
        );
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }
}
