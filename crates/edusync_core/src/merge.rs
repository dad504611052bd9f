//! Last-writer-wins merge of two snapshots.
//!
//! Resolution is per entity record, not per field: when a key exists on both
//! sides, the side whose snapshot carries the greater `last_updated` supplies
//! the whole record. At worst a record written concurrently on two devices
//! loses the earlier of the two versions, never a torn half-merged record.

use crate::model::Snapshot;
use std::collections::BTreeMap;

/// Merges a remote snapshot into the local one.
///
/// When the remote is not newer than the local (`remote.last_updated <=
/// local.last_updated`), the local snapshot is returned unchanged; this keeps
/// the steady state quiet when N devices poll the same channel. Use
/// [`force_merge`] to union regardless, e.g. after a manual "sync now".
///
/// The merge never deletes entries: the result contains every key present on
/// either side. Deletion is an explicit mutation applied by the action
/// pipeline before the merged result is persisted.
pub fn merge(local: &Snapshot, remote: &Snapshot) -> Snapshot {
    if remote.last_updated <= local.last_updated {
        return local.clone();
    }
    force_merge(local, remote)
}

/// Merges two snapshots without the remote-not-newer short-circuit.
///
/// Each entity map becomes the key union of both sides; shared keys take the
/// record from the side with the greater snapshot `last_updated`, local
/// winning ties so merging a snapshot with itself is the identity.
pub fn force_merge(local: &Snapshot, remote: &Snapshot) -> Snapshot {
    let remote_wins = remote.last_updated > local.last_updated;

    Snapshot {
        users: union(&local.users, &remote.users, remote_wins),
        courses: union(&local.courses, &remote.courses, remote_wins),
        tasks: union(&local.tasks, &remote.tasks, remote_wins),
        submissions: union(&local.submissions, &remote.submissions, remote_wins),
        last_updated: local.last_updated.max(remote.last_updated),
    }
}

fn union<V: Clone>(
    local: &BTreeMap<String, V>,
    remote: &BTreeMap<String, V>,
    remote_wins: bool,
) -> BTreeMap<String, V> {
    let (base, overlay) = if remote_wins {
        (local, remote)
    } else {
        (remote, local)
    };

    let mut merged = base.clone();
    for (key, record) in overlay {
        merged.insert(key.clone(), record.clone());
    }
    merged
}
