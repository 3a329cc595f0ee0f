//! Epic Tetris (workspace facade crate).
//!
//! Re-exports the workspace crates under one name so binaries, integration
//! tests and benches can write `epic_tetris::{core,adapter,replication,types}`.

pub use epic_tetris_adapter as adapter;
pub use epic_tetris_core as core;
pub use epic_tetris_replication as replication;
pub use epic_tetris_types as types;

/// Install the `tracing` subscriber used by the binaries.
///
/// Defaults to `info`; override with `RUST_LOG`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .try_init();
}
