//! Headless participant.
//!
//! Connects to a broker, joins (or creates) a session and plays with a
//! random input policy. Useful for filling a session while testing the
//! browser client or another bot.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use epic_tetris::adapter::connect;
use epic_tetris::core::{SimpleRng, Tetris};
use epic_tetris::replication::{ClientNotice, ReplicationClient};
use epic_tetris::types::{GameAction, TICK_MS};

#[derive(Parser, Debug, Clone)]
#[command(name = "bot", about = "Headless Epic Tetris player")]
struct Opts {
    /// Broker websocket URL
    #[arg(long, default_value = "ws://127.0.0.1:9000")]
    url: String,
    /// Session to join; a new one is created when omitted
    #[arg(long)]
    session: Option<String>,
    /// Display name
    #[arg(long, default_value = "bot")]
    name: String,
    /// Seed for pieces and input; random when omitted
    #[arg(long)]
    seed: Option<u32>,
    /// Send start-game once the session is joined
    #[arg(long)]
    start: bool,
    /// Milliseconds between two inputs
    #[arg(long, default_value_t = 200)]
    think_ms: u32,
}

const BOT_ACTIONS: [GameAction; 5] = [
    GameAction::MoveLeft,
    GameAction::MoveRight,
    GameAction::RotateCw,
    GameAction::RotateCcw,
    GameAction::HardDrop,
];

enum Outcome {
    Finished,
    Moved(String),
}

#[tokio::main]
async fn main() -> Result<()> {
    epic_tetris::init_tracing();
    let opts = Opts::parse();
    let seed = opts.seed.unwrap_or_else(rand::random);

    let mut session = opts.session.clone();
    loop {
        match play(&opts, seed, session.as_deref()).await? {
            Outcome::Finished => return Ok(()),
            Outcome::Moved(id) => {
                tracing::info!(session = %id, "moving to new session");
                session = Some(id);
            }
        }
    }
}

async fn play(opts: &Opts, seed: u32, session: Option<&str>) -> Result<Outcome> {
    let mut conn = connect(&opts.url).await?;
    let mut client = ReplicationClient::new(conn.outbound.clone());
    let mut tetris = Tetris::new(seed);
    let mut rng = SimpleRng::new(seed ^ 0x5eed);

    tetris.player_mut().set_name(opts.name.clone());
    client.watch(tetris.player_mut());
    client.init_session(&tetris, session);

    let mut ticker = tokio::time::interval(Duration::from_millis(u64::from(TICK_MS)));
    let mut since_input = 0u32;
    let mut start_sent = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tetris.frame(TICK_MS);
                if tetris.is_started() && !tetris.player().is_game_over() {
                    since_input += TICK_MS;
                    if since_input >= opts.think_ms {
                        since_input = 0;
                        tetris.player_mut().apply_action(rng.pick(&BOT_ACTIONS));
                    }
                }
                if let Some(ClientNotice::Winner(winner)) = client.after_frame(&tetris) {
                    tracing::info!(winner = %winner.name, "game finished");
                    return Ok(Outcome::Finished);
                }
                if tetris.player().is_game_over() && client.peers().next().is_none() {
                    tracing::info!(score = tetris.player().score(), "game over");
                    return Ok(Outcome::Finished);
                }
            }
            msg = conn.recv() => {
                let Some(msg) = msg else {
                    tracing::info!(score = tetris.player().score(), "broker closed the connection");
                    return Ok(Outcome::Finished);
                };
                match client.receive(msg, &mut tetris) {
                    Some(ClientNotice::SessionCreated(id)) => {
                        tracing::info!(session = %id, "joined");
                    }
                    Some(ClientNotice::DebuffReceived { kind, duration_ms }) => {
                        tracing::info!(debuff = kind.as_str(), duration_ms, "hit by debuff");
                    }
                    Some(ClientNotice::Winner(winner)) => {
                        tracing::info!(
                            winner = %winner.name,
                            local = winner.is_local,
                            "game finished"
                        );
                        return Ok(Outcome::Finished);
                    }
                    Some(ClientNotice::GoToSession(id)) => return Ok(Outcome::Moved(id)),
                    _ => {}
                }
                if opts.start && !start_sent && client.local_id().is_some() {
                    start_sent = true;
                    tetris.player_mut().request_start();
                }
            }
        }
    }
}
