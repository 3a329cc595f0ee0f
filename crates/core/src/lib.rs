//! Core game logic - the per-player simulation
//!
//! This crate contains the rules of one participant's game. It has no
//! dependencies on networking or I/O; every observable change is published
//! on a synchronous [`EventBus`] so callers (the replication layer, a
//! renderer, tests) can subscribe to exactly what they need.
//!
//! # Module Structure
//!
//! - [`arena`]: 12x20 grid with collision, merge and row sweeping
//! - [`pieces`]: square block patterns and in-place rotation
//! - [`rng`]: seeded LCG and the piece generator (canonical or random layouts)
//! - [`events`]: typed event bus
//! - [`debuff`]: expiring status-effect records
//! - [`player`]: the falling piece, gravity, scoring, debuffs
//! - [`tetris`]: start countdown and per-frame driver
//!
//! # Game Rules
//!
//! - Pieces spawn centered on the top row; a blocked spawn ends the game
//! - Rotation searches horizontal kicks +1, -2, +3, ... before giving up
//! - Clearing n rows in one lock scores `10 * (2^n - 1)`
//! - Every lock that clears rows emits a debuff for an opponent
//! - Gravity speeds up as the opponents' combined score grows
//!
//! # Example
//!
//! ```
//! use epic_tetris_core::Tetris;
//! use epic_tetris_types::GameAction;
//!
//! let mut game = Tetris::new(12345);
//! game.start_with_countdown(0);
//!
//! game.player_mut().apply_action(GameAction::MoveRight);
//! game.player_mut().apply_action(GameAction::RotateCw);
//! game.player_mut().apply_action(GameAction::HardDrop);
//!
//! assert!(game.player().arena().cells().iter().any(|&c| c != 0));
//! ```
//!
//! # Timing
//!
//! - Base gravity: 700ms per row, never below 100ms
//! - Soft drop: 35ms per row
//! - HASTE halves both while active
//! - Debuffs expire on the player's own simulation clock

pub mod arena;
pub mod debuff;
pub mod events;
pub mod pieces;
pub mod player;
pub mod rng;
pub mod tetris;

pub use epic_tetris_types as types;

// Re-export commonly used types for convenience
pub use arena::{sweep_score, Arena, ArenaEvent, ArenaEventKind, SweepResult};
pub use debuff::{ActiveDebuff, DebuffSet};
pub use events::{BusEvent, EventBus, ListenerError, ListenerResult};
pub use pieces::Piece;
pub use player::{Player, PlayerEvent, PlayerEventKind};
pub use rng::{PieceGenerator, SimpleRng};
pub use tetris::Tetris;
