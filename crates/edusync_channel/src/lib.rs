//! # EduSync Channel
//!
//! Remote channel client for EduSync.
//!
//! A *channel* is the identity under which a group of devices exchange
//! snapshots through a generic create/read/replace object store. This crate
//! provides:
//! - The [`RemoteChannel`] trait the sync engine depends on
//! - [`ObjectStoreChannel`], the HTTP object-store protocol mapping
//! - [`ReqwestClient`], a blocking HTTP client implementation
//! - [`MemoryChannel`], an in-memory store with fault injection for tests
//!
//! ## Contract
//!
//! The remote store offers no locking and no compare-and-swap. Operations are
//! not atomic or serializable across clients, and the store may return stale
//! or missing data; every write is a last-writer-wins replace. Convergence is
//! the merge resolver's job, not the channel's.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod error;
mod http;
mod memory;

pub use client::{ChannelId, RemoteChannel, RemoteObject};
pub use error::{ChannelError, ChannelResult};
pub use http::{HttpClient, HttpResponse, ObjectStoreChannel, ReqwestClient};
pub use memory::MemoryChannel;
