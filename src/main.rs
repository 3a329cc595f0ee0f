//! Session broker (default binary).
//!
//! Listens for websocket connections and relays game state between the
//! members of each session. Configuration comes from `EPIC_TETRIS_HOST` /
//! `EPIC_TETRIS_PORT`, overridden by `--host` / `--port`.

use anyhow::Result;
use clap::Parser;

use epic_tetris::adapter::{run_server, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "epic-tetris", about = "Multi-party Tetris session broker")]
struct Opts {
    /// Address to bind (overrides EPIC_TETRIS_HOST)
    #[arg(long)]
    host: Option<String>,
    /// Port to listen on (overrides EPIC_TETRIS_PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    epic_tetris::init_tracing();
    let opts = Opts::parse();

    let mut config = ServerConfig::from_env();
    if let Some(host) = opts.host {
        config.host = host;
    }
    if let Some(port) = opts.port {
        config.port = port;
    }

    run_server(config, None).await
}
