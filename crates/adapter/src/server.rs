//! Websocket server for the session broker
//!
//! Handles incoming connections and manages client lifecycle. Each
//! connection gets a reader loop and a writer task fed by an unbounded
//! channel, so frames to one client always go out in order. One mutex
//! around the [`Broker`] serializes message handling.

use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_tungstenite::{accept_async, tungstenite::Message as WsMessage};

use crate::protocol::{encode_message, parse_message, Message};
use crate::session::{Broker, SessionStore};

/// Default port, as used by the browser client
pub const DEFAULT_PORT: u16 = 9000;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Create from `EPIC_TETRIS_HOST` / `EPIC_TETRIS_PORT`, falling back to defaults
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();
        let host = env::var("EPIC_TETRIS_HOST").unwrap_or(defaults.host);
        let port = env::var("EPIC_TETRIS_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        Self { host, port }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Start the broker with an empty session store
pub async fn run_server(
    config: ServerConfig,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    run_server_with_broker(config, Broker::new(SessionStore::new()), ready_tx).await
}

/// Accept connections forever, routing every frame through `broker`
pub async fn run_server_with_broker(
    config: ServerConfig,
    broker: Broker,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let bound = listener.local_addr()?;
    tracing::info!(addr = %bound, "websocket server listening");
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let broker = Arc::new(Mutex::new(broker));

    loop {
        let (socket, addr) = listener.accept().await?;
        let broker = Arc::clone(&broker);

        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, addr, broker).await {
                tracing::warn!(%addr, error = %e, "connection error");
            }
        });
    }
}

/// Handle a single websocket connection
async fn handle_connection(
    socket: TcpStream,
    addr: SocketAddr,
    broker: Arc<Mutex<Broker>>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(socket).await?;
    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let client_id = broker.lock().await.connect(tx);
    tracing::info!(client = %client_id, %addr, "websocket open");

    // Writer: drains the outbound channel until the broker drops the sender
    let write_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let text = match encode_message(&msg) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to encode outbound message");
                    continue;
                }
            };
            if ws_tx.send(WsMessage::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    let mut result = Ok(());
    while let Some(frame) = ws_rx.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                result = Err(e.into());
                break;
            }
        };
        match frame {
            WsMessage::Text(text) => match parse_message(&text) {
                Ok(msg) => {
                    let mut broker = broker.lock().await;
                    if let Err(e) = broker.handle(&client_id, msg) {
                        tracing::warn!(client = %client_id, error = %e, "message rejected");
                    }
                }
                Err(e) => {
                    tracing::warn!(client = %client_id, error = %e, "dropping malformed frame");
                }
            },
            WsMessage::Close(_) => break,
            _ => {}
        }
    }

    if let Err(e) = broker.lock().await.disconnect(&client_id) {
        tracing::warn!(client = %client_id, error = %e, "disconnect failed");
    }
    let _ = write_task.await;
    result
}
