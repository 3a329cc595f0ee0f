//! Adapter - session broker and websocket transport
//!
//! This crate moves game state between participants. It never simulates a
//! game; it only stores the last snapshot of each client and relays deltas.
//!
//! # Protocol Overview
//!
//! One JSON object per websocket text frame, tagged by `type`:
//!
//! 1. **Session**: a client sends `create-session` or `join-session` with its
//!    full state; the server answers `session-created` (new sessions only)
//!    and sends every member a `session-broadcast` roster
//! 2. **Replication**: each local change is sent as `state-update` with a
//!    `[prop, value]` entry; the server merges it into the sender's snapshot,
//!    stamps `clientId` and relays it to the other members
//! 3. **Game control**: `start-game` and `restart-game` go to every member;
//!    a restart is followed by `go-to-session` with a fresh id
//! 4. **Debuffs**: `send-debuff` is turned into `apply-debuff` naming one
//!    random opponent that is still playing
//!
//! # Environment Variables
//!
//! - `EPIC_TETRIS_HOST`: Bind address (default: "127.0.0.1")
//! - `EPIC_TETRIS_PORT`: Port number (default: 9000)
//!
//! # Example Protocol Flow
//!
//! ```text
//! A -> Server: {"type":"join-session","id":"abc123","state":{...}}
//! Server -> A: {"type":"session-created","id":"abc123"}
//! Server -> A: {"type":"session-broadcast","peers":{"you":"q1w2e3","clients":[...]}}
//! A -> Server: {"type":"state-update","fragment":"player","entry":["score",50]}
//! Server -> B: {"type":"state-update","fragment":"player","entry":["score",50],"clientId":"q1w2e3"}
//! ```
//!
//! # Implementation
//!
//! - [`protocol`]: message definitions and the `[prop, value]` codec
//! - [`session`]: session store and broker, independent of the transport
//! - [`server`]: tokio + tokio-tungstenite server around one broker
//! - [`runtime`]: websocket client used by bots and tests

pub mod protocol;
pub mod runtime;
pub mod server;
pub mod session;

pub use epic_tetris_core as core;
pub use epic_tetris_types as types;

// Re-export protocol types for convenience
pub use protocol::*;
pub use runtime::{connect, Connection};
pub use server::{run_server, run_server_with_broker, ServerConfig, DEFAULT_PORT};
pub use session::{create_id, Broker, ClientSender, Session, SessionError, SessionStore};
