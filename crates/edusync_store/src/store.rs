//! Local store trait definition.

use crate::error::StoreResult;

/// A durable key/value store on the device.
///
/// Stores are **opaque value stores**: they hold bytes under short string
/// keys and do not interpret either. The sync engine persists the current
/// snapshot, the session identity and the channel id through this trait; see
/// [`crate::keys`] for the well-known keys.
///
/// # Invariants
///
/// - `get` returns exactly the bytes most recently `put` under that key
/// - A `put` is atomic: concurrent readers and crashes observe either the
///   old value or the new one, never a mixture
/// - Implementations must be `Send + Sync` for shared access from the engine
///   and the polling scheduler
pub trait LocalStore: Send + Sync {
    /// Reads the value stored under `key`, or `None` if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or an I/O error occurs.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the write fails.
    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Removes the value stored under `key`. Removing an absent key is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the removal fails.
    fn remove(&self, key: &str) -> StoreResult<()>;
}
