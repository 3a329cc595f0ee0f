//! Client-side websocket transport.
//!
//! Bridges a synchronous game loop with an async websocket: the loop pushes
//! [`Message`]s into `outbound` and polls `inbound` each frame.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

use crate::protocol::{encode_message, parse_message, Message};

/// Open connection to the broker
#[derive(Debug)]
pub struct Connection {
    pub outbound: mpsc::UnboundedSender<Message>,
    pub inbound: mpsc::UnboundedReceiver<Message>,
}

impl Connection {
    /// Queue a message; false once the connection is gone
    pub fn send(&self, msg: Message) -> bool {
        self.outbound.send(msg).is_ok()
    }

    /// Next decoded message without waiting
    pub fn try_recv(&mut self) -> Option<Message> {
        self.inbound.try_recv().ok()
    }

    /// Wait for the next decoded message; None once the socket closed
    pub async fn recv(&mut self) -> Option<Message> {
        self.inbound.recv().await
    }
}

/// Connect to `url` (e.g. `ws://127.0.0.1:9000`) and start the pump tasks
pub async fn connect(url: &str) -> anyhow::Result<Connection> {
    let (ws_stream, _) = connect_async(url).await?;
    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    tracing::info!(%url, "connected to broker");

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<Message>();

    tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
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

    tokio::spawn(async move {
        while let Some(frame) = ws_rx.next().await {
            match frame {
                Ok(WsMessage::Text(text)) => match parse_message(&text) {
                    Ok(msg) => {
                        if in_tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "dropping undecodable frame"),
                },
                Ok(WsMessage::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "websocket read failed");
                    break;
                }
            }
        }
        tracing::info!("broker connection closed");
    });

    Ok(Connection {
        outbound: out_tx,
        inbound: in_rx,
    })
}
