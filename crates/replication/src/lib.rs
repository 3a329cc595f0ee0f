//! Replication - keeps every participant's view of the session in sync
//!
//! - [`client`]: local events to wire messages, wire messages to mirrors
//! - [`mirror`]: proxy copies of remote participants
//! - [`update`]: the closed set of legal peer updates

pub mod client;
pub mod mirror;
pub mod update;

pub use client::{event_message, ClientNotice, ReplicationClient, Winner};
pub use mirror::PeerMirror;
pub use update::{PeerUpdate, UpdateError};
