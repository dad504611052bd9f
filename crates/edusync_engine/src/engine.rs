//! Sync engine state machine.

use crate::config::SyncConfig;
use crate::error::{ActionError, SyncError, SyncResult};
use edusync_channel::{ChannelError, ChannelId, RemoteChannel};
use edusync_core::{force_merge, merge, Fingerprint, Snapshot};
use edusync_store::{keys, LocalStore};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// The current state of the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No successful contact with the remote store yet.
    Uninitialized,
    /// Creating a fresh channel on the remote store.
    Provisioning,
    /// Between sync cycles.
    Idle,
    /// Fetching and merging remote changes.
    Pulling,
    /// Replacing the remote snapshot.
    Pushing,
    /// The store throttled this channel; automatic traffic is stopped until
    /// a new channel is provisioned.
    RateLimited,
}

impl EngineState {
    /// Returns true while a remote call is logically in flight.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            EngineState::Provisioning | EngineState::Pulling | EngineState::Pushing
        )
    }
}

/// The externally observable sync condition, polled by UI layers.
///
/// This is the whole surface callers get for failure reporting: remote
/// errors degrade these flags instead of propagating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncStatus {
    /// A pull, push or provisioning call is in flight.
    pub is_syncing: bool,
    /// The last remote call succeeded.
    pub is_online: bool,
    /// The channel is throttled and needs re-provisioning.
    pub is_rate_limited: bool,
    /// Milliseconds since epoch of the last successful sync, if any.
    pub last_sync_time: Option<u64>,
}

/// The sync engine for one replica.
///
/// Orchestrates pull/push cycles against a remote channel, keeps the local
/// store authoritative for this device, and suppresses echo writes. One
/// instance per running client, constructed explicitly and passed by
/// reference; configuration and channel identity live here, not in globals.
///
/// All methods take `&self`; interior locking keeps at most one sync cycle
/// logically in flight, so overlapping triggers (timer tick during a manual
/// sync) are skipped rather than run concurrently.
pub struct SyncEngine<C: RemoteChannel, S: LocalStore> {
    config: SyncConfig,
    channel: C,
    store: S,
    snapshot: RwLock<Snapshot>,
    channel_id: RwLock<Option<ChannelId>>,
    state: RwLock<EngineState>,
    online: AtomicBool,
    last_sync_time: RwLock<Option<u64>>,
    /// Fingerprint of the snapshot the channel is believed to hold: the last
    /// candidate this engine pushed, or the last remote it fetched. A push
    /// whose candidate matches it would re-broadcast what the channel
    /// already has, and is skipped.
    last_synced: RwLock<Option<Fingerprint>>,
    /// Serializes sync cycles; see the struct docs.
    cycle: Mutex<()>,
    /// Bumped when the channel identity changes; in-flight results from the
    /// old channel are discarded instead of applied.
    epoch: AtomicU64,
}

impl<C: RemoteChannel, S: LocalStore> SyncEngine<C, S> {
    /// Creates an engine, loading the persisted snapshot and channel id.
    ///
    /// An absent snapshot starts from [`Snapshot::initial`]; an unreadable
    /// one is logged and replaced the same way rather than failing boot. A
    /// channel id persisted in the store takes precedence over the config
    /// seed.
    ///
    /// # Errors
    ///
    /// Returns an error when the local store cannot be read.
    pub fn new(config: SyncConfig, channel: C, store: S) -> SyncResult<Self> {
        let snapshot = match store.get(keys::SNAPSHOT)? {
            Some(bytes) => match serde_json::from_slice(&bytes) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "persisted snapshot unreadable; starting from the built-in state"
                    );
                    Snapshot::initial()
                }
            },
            None => Snapshot::initial(),
        };

        let channel_id = store
            .get(keys::CHANNEL)?
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .map(ChannelId::new)
            .or_else(|| config.channel_id.clone());

        Ok(Self {
            config,
            channel,
            store,
            snapshot: RwLock::new(snapshot),
            channel_id: RwLock::new(channel_id),
            state: RwLock::new(EngineState::Uninitialized),
            online: AtomicBool::new(true),
            last_sync_time: RwLock::new(None),
            last_synced: RwLock::new(None),
            cycle: Mutex::new(()),
            epoch: AtomicU64::new(0),
        })
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the current in-memory snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.read().clone()
    }

    /// Returns the adopted channel id, if any.
    pub fn channel_id(&self) -> Option<ChannelId> {
        self.channel_id.read().clone()
    }

    /// Returns the current engine state.
    pub fn state(&self) -> EngineState {
        *self.state.read()
    }

    /// Returns the externally observable sync condition.
    pub fn status(&self) -> SyncStatus {
        let state = self.state();
        SyncStatus {
            is_syncing: state.is_active(),
            is_online: self.online.load(Ordering::SeqCst),
            is_rate_limited: state == EngineState::RateLimited,
            last_sync_time: *self.last_sync_time.read(),
        }
    }

    /// First contact with the remote store.
    ///
    /// With an adopted channel id this pulls and merges; a missing remote
    /// object (or no channel id at all) provisions a fresh channel from the
    /// local snapshot. On failure the engine stays `Uninitialized` and
    /// offline; local data keeps accumulating and the next tick retries.
    pub fn bootstrap(&self) -> SyncResult<()> {
        let _cycle = self.cycle.lock();
        let result = if self.channel_id.read().is_some() {
            self.do_pull(false).map(|_| ())
        } else {
            self.do_provision().map(|_| ())
        };

        if let Err(e) = &result {
            if !matches!(e, SyncError::RateLimited) {
                self.set_state(EngineState::Uninitialized);
            }
            tracing::warn!(error = %e, "bootstrap failed; continuing with local data only");
        }
        result
    }

    /// Fetches the remote snapshot and merges it into local state.
    ///
    /// `force` bypasses the remote-not-newer short-circuit; focus regain and
    /// an explicit "sync now" both land here with `force = true`. Returns
    /// whether local state changed. A cycle already in flight makes this a
    /// no-op.
    pub fn pull_now(&self, force: bool) -> SyncResult<bool> {
        let Some(_cycle) = self.cycle.try_lock() else {
            tracing::debug!("sync cycle in flight; pull skipped");
            return Ok(false);
        };
        self.do_pull(force)
    }

    /// Pushes the current snapshot unless its fingerprint matches what the
    /// channel already holds (echo suppression). Returns whether a remote
    /// write happened.
    ///
    /// Publishing divergence this way finalizes it as this device's write:
    /// the snapshot is re-stamped before the push, so peers' unforced pulls
    /// see it as newer and adopt it.
    pub fn push_now(&self) -> SyncResult<bool> {
        let Some(_cycle) = self.cycle.try_lock() else {
            tracing::debug!("sync cycle in flight; push skipped");
            return Ok(false);
        };
        if self.state() == EngineState::RateLimited {
            return Err(SyncError::RateLimited);
        }
        if self.channel_id.read().is_none() {
            return Err(SyncError::NotProvisioned);
        }

        let fingerprint = self.snapshot.read().fingerprint()?;
        if *self.last_synced.read() == Some(fingerprint) {
            tracing::debug!("push suppressed: snapshot already on the channel");
            return Ok(false);
        }

        let stamped = {
            let mut local = self.snapshot.write();
            local.last_updated = now_ms().max(local.last_updated + 1);
            local.clone()
        };
        self.persist_snapshot(&stamped)?;
        self.do_push()
    }

    /// Provisions a brand-new channel from the current local snapshot and
    /// adopts its id.
    ///
    /// This is the single recovery action out of the rate-limited state: the
    /// old channel is abandoned and the device starts a fresh replica group.
    pub fn create_channel(&self) -> SyncResult<ChannelId> {
        let _cycle = self.cycle.lock();
        self.do_provision()
    }

    /// Switches to a different channel id and persists it.
    ///
    /// Any in-flight cycle against the old channel has its result discarded.
    /// The echo fingerprint is reset so the first push to the new channel is
    /// never suppressed.
    pub fn set_channel_id(&self, id: ChannelId) -> SyncResult<()> {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.store.put(keys::CHANNEL, id.as_str().as_bytes())?;
        *self.channel_id.write() = Some(id.clone());
        *self.last_synced.write() = None;
        self.set_state(EngineState::Idle);
        tracing::info!(channel = %id, "switched sync channel");
        Ok(())
    }

    /// One scheduler tick: pull when provisioned, otherwise attempt boot.
    ///
    /// Errors are swallowed here: transient failures surface through
    /// [`SyncEngine::status`] and the next tick retries. Rate limiting stops
    /// ticks entirely until [`SyncEngine::create_channel`] succeeds.
    pub fn tick(&self) {
        if self.state() == EngineState::RateLimited {
            return;
        }
        let result = if self.channel_id.read().is_some() {
            self.pull_now(false).map(|_| ())
        } else {
            self.bootstrap()
        };
        if let Err(e) = result {
            tracing::debug!(error = %e, "sync tick failed; retrying next tick");
        }
    }

    /// Applies a mutation on top of the freshest reachable state.
    ///
    /// The mutator observes `merge(local, remote)` when the store is
    /// reachable and plain local state otherwise, so two sequential updates
    /// from one device never clobber each other; cross-device races resolve
    /// in a later merge. The result is stamped with a strictly increasing
    /// `last_updated`, persisted locally first, then pushed best-effort; a
    /// failed push never rolls the mutation back.
    ///
    /// # Errors
    ///
    /// Only mutator rejections and local persistence failures; remote
    /// failures degrade to status flags.
    pub fn perform_update<F>(&self, mutator: F) -> Result<(), ActionError>
    where
        F: FnOnce(Snapshot) -> Result<Snapshot, ActionError>,
    {
        let _cycle = self.cycle.lock();

        let base = self.remote_merged_base();
        let mutated = mutator(base.clone())?;

        if mutated == base {
            // Nothing new to say: adopt any remote data the fetch brought in
            // and skip the stamp, so peers never see a phantom write.
            return self.apply_merged(base);
        }

        let mut next = mutated;
        next.last_updated = now_ms().max(base.last_updated + 1);

        *self.snapshot.write() = next.clone();
        self.persist_snapshot(&next)
            .map_err(|e| ActionError::Storage(e.to_string()))?;

        if let Err(e) = self.do_push() {
            tracing::debug!(error = %e, "push deferred; a later pull reconverges");
        }
        Ok(())
    }

    fn do_pull(&self, force: bool) -> SyncResult<bool> {
        if self.state() == EngineState::RateLimited {
            return Err(SyncError::RateLimited);
        }
        let id = self
            .channel_id
            .read()
            .clone()
            .ok_or(SyncError::NotProvisioned)?;

        let epoch = self.epoch.load(Ordering::SeqCst);
        self.set_state(EngineState::Pulling);

        let remote = match self.channel.fetch_snapshot(&id) {
            Ok(remote) => remote,
            Err(ChannelError::NotFound) => {
                // Channel never provisioned (or expired server-side): seed it
                // from local state instead of merging.
                self.check_epoch(epoch)?;
                self.do_provision()?;
                return Ok(false);
            }
            Err(e) => return Err(self.fail_remote(e)),
        };
        self.check_epoch(epoch)?;
        self.online.store(true, Ordering::SeqCst);

        // Remember what the channel holds so the next push cycle does not
        // re-broadcast a snapshot this device only received.
        let remote_fingerprint = remote.fingerprint()?;

        let changed = {
            let mut local = self.snapshot.write();
            let merged = if force {
                force_merge(&local, &remote)
            } else {
                merge(&local, &remote)
            };
            if merged != *local {
                *local = merged;
                true
            } else {
                false
            }
        };

        if changed {
            let applied = self.snapshot.read().clone();
            tracing::debug!(last_updated = applied.last_updated, "applied remote changes");
            self.persist_snapshot(&applied)?;
        }
        *self.last_synced.write() = Some(remote_fingerprint);
        *self.last_sync_time.write() = Some(now_ms());
        self.set_state(EngineState::Idle);
        Ok(changed)
    }

    fn do_push(&self) -> SyncResult<bool> {
        if self.state() == EngineState::RateLimited {
            return Err(SyncError::RateLimited);
        }
        let id = self
            .channel_id
            .read()
            .clone()
            .ok_or(SyncError::NotProvisioned)?;

        let candidate = self.snapshot.read().clone();
        let fingerprint = candidate.fingerprint()?;
        if *self.last_synced.read() == Some(fingerprint) {
            tracing::debug!("push suppressed: snapshot already on the channel");
            return Ok(false);
        }

        let epoch = self.epoch.load(Ordering::SeqCst);
        self.set_state(EngineState::Pushing);

        match self.channel.replace_snapshot(&id, &candidate) {
            Ok(()) => {
                self.check_epoch(epoch)?;
                self.finish_push(fingerprint);
                Ok(true)
            }
            Err(ChannelError::NotFound) => {
                // The object vanished underneath us: recreate the channel
                // with the candidate rather than dropping the write.
                self.check_epoch(epoch)?;
                let new_id = self.do_provision()?;
                tracing::info!(channel = %new_id, "recreated missing channel during push");
                Ok(true)
            }
            Err(e) => Err(self.fail_remote(e)),
        }
    }

    fn do_provision(&self) -> SyncResult<ChannelId> {
        let previous = self.state();
        self.set_state(EngineState::Provisioning);
        let local = self.snapshot.read().clone();

        match self.channel.create_channel(&local) {
            Ok(id) => {
                self.epoch.fetch_add(1, Ordering::SeqCst);
                self.store.put(keys::CHANNEL, id.as_str().as_bytes())?;
                *self.channel_id.write() = Some(id.clone());
                *self.last_synced.write() = Some(local.fingerprint()?);
                *self.last_sync_time.write() = Some(now_ms());
                self.online.store(true, Ordering::SeqCst);
                self.set_state(EngineState::Idle);
                Ok(id)
            }
            Err(ChannelError::RateLimited) => Err(self.fail_remote(ChannelError::RateLimited)),
            Err(e) => {
                let err = self.fail_remote(e);
                // A failed re-provision must not clear the throttle state.
                self.set_state(if previous == EngineState::RateLimited {
                    EngineState::RateLimited
                } else {
                    EngineState::Uninitialized
                });
                Err(err)
            }
        }
    }

    /// Converts a channel failure into engine state and the matching error.
    fn fail_remote(&self, error: ChannelError) -> SyncError {
        match error {
            ChannelError::RateLimited => {
                tracing::warn!("remote store rate limited this channel; sync paused");
                self.set_state(EngineState::RateLimited);
                SyncError::RateLimited
            }
            ChannelError::NotFound => {
                // Callers handle NotFound before reaching here.
                self.set_state(EngineState::Idle);
                SyncError::Offline("channel not found".to_string())
            }
            ChannelError::Transport(message) => {
                self.online.store(false, Ordering::SeqCst);
                self.set_state(EngineState::Idle);
                SyncError::Offline(message)
            }
            ChannelError::Status(code) => {
                self.online.store(false, Ordering::SeqCst);
                self.set_state(EngineState::Idle);
                SyncError::Offline(format!("unexpected HTTP status {code}"))
            }
            ChannelError::Format(e) => {
                self.set_state(EngineState::Idle);
                SyncError::RemoteFormat(e.to_string())
            }
        }
    }

    fn finish_push(&self, fingerprint: Fingerprint) {
        *self.last_synced.write() = Some(fingerprint);
        *self.last_sync_time.write() = Some(now_ms());
        self.online.store(true, Ordering::SeqCst);
        self.set_state(EngineState::Idle);
    }

    /// Best-effort fetch of `merge(local, remote)` for the mutator to
    /// observe; any remote failure falls back to plain local state.
    fn remote_merged_base(&self) -> Snapshot {
        let local = self.snapshot.read().clone();
        if self.state() == EngineState::RateLimited {
            return local;
        }
        let Some(id) = self.channel_id.read().clone() else {
            return local;
        };

        let epoch = self.epoch.load(Ordering::SeqCst);
        self.set_state(EngineState::Pulling);
        match self.channel.fetch_snapshot(&id) {
            Ok(remote) => {
                if self.epoch.load(Ordering::SeqCst) != epoch {
                    self.set_state(EngineState::Idle);
                    return local;
                }
                self.online.store(true, Ordering::SeqCst);
                self.set_state(EngineState::Idle);
                match remote.fingerprint() {
                    Ok(fp) => *self.last_synced.write() = Some(fp),
                    Err(e) => tracing::warn!(error = %e, "fingerprint failed for fetched remote"),
                }
                merge(&local, &remote)
            }
            Err(ChannelError::NotFound) => {
                // Push recreates the channel afterwards.
                self.set_state(EngineState::Idle);
                local
            }
            Err(e) => {
                tracing::debug!(error = %e, "update proceeding with local state only");
                let _ = self.fail_remote(e);
                local
            }
        }
    }

    /// Adopts a merged snapshot produced by a mutator no-op, persisting it
    /// when it differs from current local state.
    fn apply_merged(&self, merged: Snapshot) -> Result<(), ActionError> {
        let changed = {
            let mut local = self.snapshot.write();
            if *local != merged {
                *local = merged.clone();
                true
            } else {
                false
            }
        };
        if changed {
            self.persist_snapshot(&merged)
                .map_err(|e| ActionError::Storage(e.to_string()))?;
        }
        Ok(())
    }

    fn persist_snapshot(&self, snapshot: &Snapshot) -> SyncResult<()> {
        let bytes = serde_json::to_vec(snapshot)?;
        self.store.put(keys::SNAPSHOT, &bytes)?;
        Ok(())
    }

    fn check_epoch(&self, epoch: u64) -> SyncResult<()> {
        if self.epoch.load(Ordering::SeqCst) != epoch {
            tracing::debug!("channel changed mid-cycle; discarding late result");
            self.set_state(EngineState::Idle);
            return Err(SyncError::Cancelled);
        }
        Ok(())
    }

    fn set_state(&self, state: EngineState) {
        *self.state.write() = state;
    }
}

/// Milliseconds since the Unix epoch.
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use edusync_channel::MemoryChannel;
    use edusync_store::{MemoryStore, LocalStore};
    use std::sync::Arc;

    fn engine_on(
        channel: Arc<MemoryChannel>,
    ) -> SyncEngine<Arc<MemoryChannel>, MemoryStore> {
        SyncEngine::new(SyncConfig::new(), channel, MemoryStore::new()).unwrap()
    }

    #[test]
    fn starts_uninitialized_with_initial_snapshot() {
        let engine = engine_on(Arc::new(MemoryChannel::new()));
        assert_eq!(engine.state(), EngineState::Uninitialized);
        assert_eq!(engine.snapshot(), Snapshot::initial());
        assert_eq!(engine.channel_id(), None);
    }

    #[test]
    fn bootstrap_without_channel_provisions_one() {
        let channel = Arc::new(MemoryChannel::new());
        let engine = engine_on(Arc::clone(&channel));

        engine.bootstrap().unwrap();

        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(channel.create_count(), 1);
        let id = engine.channel_id().unwrap();
        assert_eq!(channel.stored(&id).unwrap(), Snapshot::initial());
    }

    #[test]
    fn bootstrap_merges_an_existing_channel() {
        let channel = Arc::new(MemoryChannel::new());
        let mut remote = Snapshot::initial();
        remote.last_updated = 500;
        let id = channel.create_channel(&remote).unwrap();

        let store = MemoryStore::new();
        store
            .put(edusync_store::keys::CHANNEL, id.as_str().as_bytes())
            .unwrap();
        let engine =
            SyncEngine::new(SyncConfig::new(), Arc::clone(&channel), store).unwrap();

        engine.bootstrap().unwrap();
        assert_eq!(engine.snapshot().last_updated, 500);
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(channel.create_count(), 1);
    }

    #[test]
    fn pull_without_channel_is_not_provisioned() {
        let engine = engine_on(Arc::new(MemoryChannel::new()));
        assert!(matches!(
            engine.pull_now(false),
            Err(SyncError::NotProvisioned)
        ));
    }

    #[test]
    fn transient_boot_failure_leaves_engine_offline() {
        let channel = Arc::new(MemoryChannel::new());
        channel.set_offline(true);
        let engine = engine_on(Arc::clone(&channel));

        assert!(engine.bootstrap().is_err());
        assert_eq!(engine.state(), EngineState::Uninitialized);
        assert!(!engine.status().is_online);

        // Connectivity returns; the next tick recovers without intervention.
        channel.set_offline(false);
        engine.tick();
        assert_eq!(engine.state(), EngineState::Idle);
        assert!(engine.status().is_online);
    }

    #[test]
    fn corrupt_persisted_snapshot_falls_back_to_initial() {
        let store = MemoryStore::new();
        store
            .put(edusync_store::keys::SNAPSHOT, b"{not json")
            .unwrap();
        let engine =
            SyncEngine::new(SyncConfig::new(), Arc::new(MemoryChannel::new()), store).unwrap();
        assert_eq!(engine.snapshot(), Snapshot::initial());
    }

    #[test]
    fn persisted_channel_id_wins_over_config_seed() {
        let store = MemoryStore::new();
        store
            .put(edusync_store::keys::CHANNEL, b"persisted")
            .unwrap();
        let config = SyncConfig::new().with_channel_id(ChannelId::new("seeded"));
        let engine = SyncEngine::new(config, Arc::new(MemoryChannel::new()), store).unwrap();
        assert_eq!(engine.channel_id(), Some(ChannelId::new("persisted")));
    }

    #[test]
    fn set_channel_id_resets_echo_fingerprint() {
        let channel = Arc::new(MemoryChannel::new());
        let engine = engine_on(Arc::clone(&channel));
        engine.bootstrap().unwrap();

        // The provisioned snapshot is remembered; pushing it again is an echo.
        assert!(!engine.push_now().unwrap());

        let other = channel.create_channel(&Snapshot::initial()).unwrap();
        engine.set_channel_id(other.clone()).unwrap();

        // Fresh channel identity: the same content must go out once.
        assert!(engine.push_now().unwrap());
        assert_eq!(engine.channel_id(), Some(other));
    }

    #[test]
    fn forced_pull_unions_an_older_remote() {
        let channel = Arc::new(MemoryChannel::new());
        let engine = engine_on(Arc::clone(&channel));
        engine.bootstrap().unwrap();
        let id = engine.channel_id().unwrap();

        engine
            .perform_update(|mut s| {
                if let Some(u) = s.users.get_mut("admin") {
                    u.rating = 1;
                }
                Ok(s)
            })
            .unwrap();

        // A peer overwrites the channel with an older snapshot that carries
        // an extra course.
        let mut older = Snapshot::initial();
        older.last_updated = 0;
        older.courses.insert(
            "c1".to_string(),
            edusync_core::Course {
                id: "c1".to_string(),
                title: "Physics".to_string(),
                description: String::new(),
                instructor: "admin".to_string(),
                duration: "6 weeks".to_string(),
                level: edusync_core::CourseLevel::Beginner,
                student_usernames: Vec::new(),
                task_ids: Vec::new(),
                created_date: String::new(),
            },
        );
        channel.insert(id, older);

        // An unforced pull ignores the not-newer remote.
        assert!(!engine.pull_now(false).unwrap());
        assert!(engine.snapshot().courses.is_empty());

        // A forced refresh unions it in.
        assert!(engine.pull_now(true).unwrap());
        assert!(engine.snapshot().courses.contains_key("c1"));
    }

    #[test]
    fn perform_update_persists_before_push_failures_matter() {
        let channel = Arc::new(MemoryChannel::new());
        let engine = engine_on(Arc::clone(&channel));
        engine.bootstrap().unwrap();

        channel.set_offline(true);
        engine
            .perform_update(|mut s| {
                if let Some(u) = s.users.get_mut("admin") {
                    u.total_score = 10;
                }
                Ok(s)
            })
            .unwrap();

        // The mutation is durable locally even though the push failed.
        assert_eq!(engine.snapshot().users["admin"].total_score, 10);
        assert!(!engine.status().is_online);

        let stored = engine.store.get(keys::SNAPSHOT).unwrap().unwrap();
        let persisted: Snapshot = serde_json::from_slice(&stored).unwrap();
        assert_eq!(persisted.users["admin"].total_score, 10);
    }

    #[test]
    fn mutator_rejection_leaves_state_untouched() {
        let channel = Arc::new(MemoryChannel::new());
        let engine = engine_on(Arc::clone(&channel));
        engine.bootstrap().unwrap();
        let before = engine.snapshot();

        let result = engine.perform_update(|_| {
            Err(ActionError::UsernameTaken("admin".to_string()))
        });
        assert!(matches!(result, Err(ActionError::UsernameTaken(_))));
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn stamping_is_strictly_monotonic() {
        let channel = Arc::new(MemoryChannel::new());
        let engine = engine_on(Arc::clone(&channel));
        engine.bootstrap().unwrap();

        engine
            .perform_update(|mut s| {
                if let Some(u) = s.users.get_mut("admin") {
                    u.rating = 1;
                }
                Ok(s)
            })
            .unwrap();
        let first = engine.snapshot().last_updated;

        engine
            .perform_update(|mut s| {
                if let Some(u) = s.users.get_mut("admin") {
                    u.rating = 2;
                }
                Ok(s)
            })
            .unwrap();
        let second = engine.snapshot().last_updated;

        assert!(second > first);
    }
}
