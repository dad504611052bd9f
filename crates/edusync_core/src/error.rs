//! Validation errors for imported snapshots.

use thiserror::Error;

/// Result type for snapshot validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Structural problems in a snapshot received from outside the engine
/// (an import file, a hand-edited channel).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A user map key does not match the record's normalized username.
    #[error("user map key {key:?} does not match record username {username:?}")]
    UsernameKeyMismatch {
        /// The offending map key.
        key: String,
        /// The username stored in the record.
        username: String,
    },
}
