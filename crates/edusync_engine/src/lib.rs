//! # EduSync Engine
//!
//! Sync state machine and action pipeline for EduSync.
//!
//! This crate provides:
//! - [`SyncEngine`]: pull/push orchestration, echo suppression, rate-limit
//!   handling and the status surface
//! - [`ActionPipeline`]: the mutate-and-sync contract used by UI layers
//! - [`SyncScheduler`]: the cooperative polling task
//!
//! ## Architecture
//!
//! The engine implements **merge-then-write** replication over a dumb
//! object store:
//! 1. Pull the remote snapshot and merge it into local state
//! 2. Apply the local mutation on top of the merged state
//! 3. Persist locally (the device's source of truth), then push
//!
//! ## Key Invariants
//!
//! - Local state is authoritative for this device; a failed push never rolls
//!   a mutation back
//! - `lastUpdated` strictly increases across accepted snapshots
//! - At most one sync cycle is logically in flight per channel
//! - A snapshot the engine just pushed or applied is never pushed again
//!   (fingerprint echo suppression)
//! - Remote failures degrade to status flags; they never escalate through
//!   the action pipeline

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod actions;
mod config;
mod engine;
mod error;
mod scheduler;

pub use actions::ActionPipeline;
pub use config::{SyncConfig, DEFAULT_POLL_INTERVAL};
pub use engine::{EngineState, SyncEngine, SyncStatus};
pub use error::{ActionError, SyncError, SyncResult};
pub use scheduler::SyncScheduler;
