//! Content fingerprints for echo suppression.

use crate::model::Snapshot;
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 digest of a snapshot's canonical JSON serialization.
///
/// Two snapshots compare equal exactly when their fingerprints do, because
/// the entity maps serialize in key order. The sync engine remembers the
/// fingerprint of the last snapshot it pushed or pulled-and-applied and skips
/// any push whose candidate fingerprint matches, so a device never
/// re-broadcasts a snapshot it only just received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Computes the fingerprint of a snapshot.
    pub fn of(snapshot: &Snapshot) -> Result<Self, serde_json::Error> {
        let bytes = serde_json::to_vec(snapshot)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(Self(hasher.finalize().into()))
    }

    /// Returns the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Snapshot {
    /// Computes this snapshot's content fingerprint.
    ///
    /// Serialization of the snapshot types cannot fail in practice; the
    /// `Result` only propagates the serializer's error type.
    pub fn fingerprint(&self) -> Result<Fingerprint, serde_json::Error> {
        Fingerprint::of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Role, User};

    fn user(name: &str) -> User {
        User {
            username: name.to_string(),
            password_hash: "0".to_string(),
            role: Role::User,
            courses: Vec::new(),
            total_score: 0,
            rating: 0,
            registration_date: String::new(),
        }
    }

    #[test]
    fn equal_snapshots_share_a_fingerprint() {
        let a = Snapshot::initial();
        let b = Snapshot::initial();
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    #[test]
    fn any_field_change_alters_the_fingerprint() {
        let a = Snapshot::initial();

        let mut newer = a.clone();
        newer.last_updated += 1;
        assert_ne!(a.fingerprint().unwrap(), newer.fingerprint().unwrap());

        let mut grown = a.clone();
        grown.users.insert("bob".to_string(), user("bob"));
        assert_ne!(a.fingerprint().unwrap(), grown.fingerprint().unwrap());
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let mut a = Snapshot::initial();
        a.users.insert("bob".to_string(), user("bob"));
        a.users.insert("alice".to_string(), user("alice"));

        let mut b = Snapshot::initial();
        b.users.insert("alice".to_string(), user("alice"));
        b.users.insert("bob".to_string(), user("bob"));

        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    #[test]
    fn hex_display_is_64_chars() {
        let fp = Snapshot::initial().fingerprint().unwrap();
        assert_eq!(fp.to_string().len(), 64);
    }
}
