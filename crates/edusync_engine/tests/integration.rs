//! Integration tests: multiple engines converging through one shared
//! in-memory channel store.

use edusync_channel::{ChannelId, MemoryChannel, RemoteChannel};
use edusync_core::{normalize_username, Snapshot};
use edusync_engine::{ActionError, ActionPipeline, SyncConfig, SyncEngine, SyncError};
use edusync_store::MemoryStore;
use std::sync::Arc;

type TestEngine = SyncEngine<Arc<MemoryChannel>, MemoryStore>;

fn engine_on(channel: &Arc<MemoryChannel>) -> TestEngine {
    SyncEngine::new(SyncConfig::new(), Arc::clone(channel), MemoryStore::new()).unwrap()
}

fn engine_joining(channel: &Arc<MemoryChannel>, id: &ChannelId) -> TestEngine {
    let config = SyncConfig::new().with_channel_id(id.clone());
    SyncEngine::new(config, Arc::clone(channel), MemoryStore::new()).unwrap()
}

#[test]
fn boot_against_missing_channel_provisions_and_roundtrips() {
    let channel = Arc::new(MemoryChannel::new());
    let engine = engine_on(&channel);

    engine.bootstrap().unwrap();

    // The engine adopted the created id, and fetching it returns the same
    // data the engine seeded it with.
    let id = engine.channel_id().expect("channel adopted at boot");
    let fetched = channel.fetch_snapshot(&id).unwrap();
    assert_eq!(fetched, engine.snapshot());
    assert_eq!(channel.create_count(), 1);
}

#[test]
fn pull_that_returns_own_push_does_not_push_again() {
    let channel = Arc::new(MemoryChannel::new());
    let engine = engine_on(&channel);
    engine.bootstrap().unwrap();
    let pipeline = ActionPipeline::new(&engine);

    pipeline.register("zara", "pw").unwrap();
    let writes_after_push = channel.write_count();

    // The scheduled pull hands back exactly what this device pushed.
    engine.pull_now(false).unwrap();
    assert!(!engine.push_now().unwrap());
    assert_eq!(channel.write_count(), writes_after_push);
}

#[test]
fn registration_race_has_one_winner_and_a_rejected_loser() {
    let channel = Arc::new(MemoryChannel::new());

    let first = engine_on(&channel);
    first.bootstrap().unwrap();
    let id = first.channel_id().unwrap();

    let second = engine_joining(&channel, &id);
    second.bootstrap().unwrap();

    let first_pipeline = ActionPipeline::new(&first);
    let second_pipeline = ActionPipeline::new(&second);

    first_pipeline.register("zara", "from-first").unwrap();

    // The second device races for the same name; its update pulls the fresh
    // remote state and must observe the existing record.
    let result = second_pipeline.register("Zara", "from-second");
    assert!(matches!(result, Err(ActionError::UsernameTaken(name)) if name == "zara"));

    // After convergence there is exactly one record, the winner's.
    second.pull_now(true).unwrap();
    first.pull_now(true).unwrap();
    let converged = first.snapshot();
    assert_eq!(converged, second.snapshot());
    assert_eq!(
        converged.users[&normalize_username("zara")].password_hash,
        edusync_core::password_digest("from-first")
    );
}

#[test]
fn two_devices_union_their_entities() {
    let channel = Arc::new(MemoryChannel::new());

    let first = engine_on(&channel);
    first.bootstrap().unwrap();
    let id = first.channel_id().unwrap();
    let second = engine_joining(&channel, &id);
    second.bootstrap().unwrap();

    ActionPipeline::new(&first).register("alice", "a").unwrap();
    ActionPipeline::new(&second).register("bob", "b").unwrap();

    first.pull_now(false).unwrap();
    second.pull_now(false).unwrap();

    let snapshot = first.snapshot();
    assert!(snapshot.users.contains_key("alice"));
    assert!(snapshot.users.contains_key("bob"));
    assert_eq!(snapshot, second.snapshot());
}

#[test]
fn rate_limited_push_halts_sync_until_reprovision() {
    let channel = Arc::new(MemoryChannel::new());
    let engine = engine_on(&channel);
    engine.bootstrap().unwrap();
    let pipeline = ActionPipeline::new(&engine);

    channel.set_rate_limited(true);
    pipeline.register("zara", "pw").unwrap();

    // The mutation is durable locally; sync is degraded, not broken.
    assert!(engine.snapshot().users.contains_key("zara"));
    assert!(engine.status().is_rate_limited);

    // Automatic traffic stops: ticks and manual pulls refuse the channel.
    let fetches = channel.fetch_count();
    engine.tick();
    assert_eq!(channel.fetch_count(), fetches);
    assert!(matches!(engine.pull_now(true), Err(SyncError::RateLimited)));

    // A failed re-provision keeps the throttle state.
    assert!(engine.create_channel().is_err());
    assert!(engine.status().is_rate_limited);

    // The single recovery action: provision a fresh channel.
    channel.set_rate_limited(false);
    let new_id = engine.create_channel().unwrap();
    assert!(!engine.status().is_rate_limited);
    assert!(channel.stored(&new_id).unwrap().users.contains_key("zara"));

    // Sync flows again on the new replica group.
    engine.pull_now(true).unwrap();
    assert!(engine.status().is_online);
}

#[test]
fn offline_mutations_reconverge_after_connectivity_returns() {
    let channel = Arc::new(MemoryChannel::new());

    let first = engine_on(&channel);
    first.bootstrap().unwrap();
    let id = first.channel_id().unwrap();
    let second = engine_joining(&channel, &id);
    second.bootstrap().unwrap();

    // First device goes offline and keeps mutating.
    channel.set_offline(true);
    ActionPipeline::new(&first).register("offline-user", "pw").unwrap();
    assert!(!first.status().is_online);

    // Meanwhile the second device writes to the channel. The pause keeps the
    // two writes on distinct millisecond timestamps.
    std::thread::sleep(std::time::Duration::from_millis(5));
    channel.set_offline(false);
    ActionPipeline::new(&second).register("online-user", "pw").unwrap();

    // Connectivity returns: pull merges the peer's data, push publishes ours.
    first.pull_now(false).unwrap();
    assert!(first.push_now().unwrap());
    second.pull_now(false).unwrap();

    for engine in [&first, &second] {
        let snapshot = engine.snapshot();
        assert!(snapshot.users.contains_key("offline-user"));
        assert!(snapshot.users.contains_key("online-user"));
    }
    assert!(first.status().is_online);
}

#[test]
fn newer_remote_wins_shared_records_after_merge() {
    let channel = Arc::new(MemoryChannel::new());

    // Seed the channel with local {lastUpdated: 100, users: {a}}-style data.
    let mut seeded = Snapshot::initial();
    seeded.last_updated = 100;
    let id = channel.create_channel(&seeded).unwrap();

    let engine = engine_joining(&channel, &id);
    engine.bootstrap().unwrap();
    assert_eq!(engine.snapshot().last_updated, 100);

    // A peer replaces the channel with a newer snapshot carrying another user.
    let mut newer = engine.snapshot();
    newer.last_updated = 200;
    let mut peer_user = newer.users["admin"].clone();
    peer_user.username = "peer".to_string();
    newer.users.insert("peer".to_string(), peer_user);
    channel.replace_snapshot(&id, &newer).unwrap();

    engine.pull_now(false).unwrap();
    let merged = engine.snapshot();
    assert_eq!(merged.last_updated, 200);
    assert!(merged.users.contains_key("admin"));
    assert!(merged.users.contains_key("peer"));
}

#[test]
fn merge_never_deletes_peer_records() {
    let channel = Arc::new(MemoryChannel::new());

    let first = engine_on(&channel);
    first.bootstrap().unwrap();
    let id = first.channel_id().unwrap();
    let second = engine_joining(&channel, &id);
    second.bootstrap().unwrap();

    ActionPipeline::new(&first).register("zara", "pw").unwrap();
    second.pull_now(false).unwrap();
    assert!(second.snapshot().users.contains_key("zara"));

    // Deletion is an explicit mutation on the deleting device, and its push
    // removes the record from the channel copy.
    ActionPipeline::new(&first).delete_user("zara").unwrap();
    assert!(!first.snapshot().users.contains_key("zara"));
    assert!(!channel.stored(&id).unwrap().users.contains_key("zara"));

    // A peer that already holds the record keeps it: entity maps are
    // append/overwrite-only from the merge's perspective.
    second.pull_now(false).unwrap();
    assert!(second.snapshot().users.contains_key("zara"));
}
