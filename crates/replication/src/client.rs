//! Replication client
//!
//! Turns local player events into wire messages, and wire messages into
//! changes to peer mirrors or to the local game.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use epic_tetris_adapter::protocol::{build_state, ClientId, Entry, Message, Roster, SessionId};
use epic_tetris_core::{ArenaEvent, ArenaEventKind, Player, PlayerEvent, PlayerEventKind, Tetris};
use epic_tetris_types::{DebuffKind, Fragment};

use crate::mirror::PeerMirror;
use crate::update::PeerUpdate;

/// The last participant still playing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Winner {
    pub id: ClientId,
    pub name: String,
    pub is_local: bool,
}

/// Something the embedding application should react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientNotice {
    SessionCreated(SessionId),
    RosterChanged {
        joined: Vec<ClientId>,
        left: Vec<ClientId>,
    },
    GameStarted,
    RestartRequested,
    /// A debuff was applied to the local player
    DebuffReceived { kind: DebuffKind, duration_ms: u32 },
    /// A debuff landed on a peer
    DebuffLanded { target: ClientId, kind: DebuffKind },
    Winner(Winner),
    /// Move to another session (sent after a restart)
    GoToSession(SessionId),
}

/// Wire message for a local player event, if it is replicated
pub fn event_message(event: &PlayerEvent) -> Option<Message> {
    let msg = match event {
        PlayerEvent::Pos(pos) => Message::player_update(Entry::Pos((*pos).into())),
        PlayerEvent::Score(score) => Message::player_update(Entry::Score(*score)),
        PlayerEvent::Matrix(piece) => Message::player_update(Entry::Matrix(piece.rows())),
        PlayerEvent::GameOver(v) => Message::player_update(Entry::GameOver(*v)),
        PlayerEvent::Name(name) => Message::player_update(Entry::Name(name.clone())),
        PlayerEvent::SendDebuff { kind, duration_ms } => Message::SendDebuff {
            debuff_type: *kind,
            duration: *duration_ms,
        },
        PlayerEvent::StartGame => Message::StartGame,
        PlayerEvent::RestartGame => Message::RestartGame,
        PlayerEvent::DebuffStarted(_) | PlayerEvent::DebuffEnded(_) => return None,
    };
    Some(msg)
}

const REPLICATED_EVENTS: [PlayerEventKind; 8] = [
    PlayerEventKind::Pos,
    PlayerEventKind::Score,
    PlayerEventKind::Matrix,
    PlayerEventKind::GameOver,
    PlayerEventKind::Name,
    PlayerEventKind::SendDebuff,
    PlayerEventKind::StartGame,
    PlayerEventKind::RestartGame,
];

#[derive(Debug)]
pub struct ReplicationClient {
    outbound: mpsc::UnboundedSender<Message>,
    session_id: Option<SessionId>,
    local_id: Option<ClientId>,
    peers: BTreeMap<ClientId, PeerMirror>,
    /// Set by the watched player's game-over event, cleared by `after_frame`
    local_ended: Arc<AtomicBool>,
}

impl ReplicationClient {
    pub fn new(outbound: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            outbound,
            session_id: None,
            local_id: None,
            peers: BTreeMap::new(),
            local_ended: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Announce the local game: join `session` or create a new one
    pub fn init_session(&mut self, tetris: &Tetris, session: Option<&str>) {
        let state = build_state(tetris.player());
        let msg = match session {
            Some(id) => {
                self.session_id = Some(id.to_string());
                Message::JoinSession {
                    id: id.to_string(),
                    state,
                }
            }
            None => Message::CreateSession { state },
        };
        self.send(msg);
    }

    /// Forward every replicated event of `player` to the broker
    pub fn watch(&self, player: &mut Player) {
        for kind in REPLICATED_EVENTS {
            let tx = self.outbound.clone();
            player.events_mut().listen(kind, move |event| {
                match event_message(event) {
                    Some(msg) => tx.send(msg).map_err(Into::into),
                    None => Ok(()),
                }
            });
        }

        let ended = Arc::clone(&self.local_ended);
        player
            .events_mut()
            .listen(PlayerEventKind::GameOver, move |event| {
                if matches!(event, PlayerEvent::GameOver(true)) {
                    ended.store(true, Ordering::Release);
                }
                Ok(())
            });

        let tx = self.outbound.clone();
        player
            .arena_mut()
            .events_mut()
            .listen(ArenaEventKind::Matrix, move |event| {
                let ArenaEvent::Matrix(rows) = event;
                tx.send(Message::arena_update(rows.clone()))
                    .map_err(Into::into)
            });
    }

    /// Handle one message from the broker
    pub fn receive(&mut self, msg: Message, tetris: &mut Tetris) -> Option<ClientNotice> {
        match msg {
            Message::SessionCreated { id } => {
                tracing::info!(session = %id, "session created");
                self.session_id = Some(id.clone());
                Some(ClientNotice::SessionCreated(id))
            }
            Message::SessionBroadcast { peers } => {
                let notice = self.update_roster(peers);
                self.refresh_opponent_scores(tetris.player_mut());
                notice
            }
            Message::StateUpdate {
                fragment,
                entry,
                client_id,
            } => self.update_peer(client_id, fragment, entry, tetris),
            Message::StartGame => {
                if !tetris.is_started() {
                    tetris.start();
                }
                Some(ClientNotice::GameStarted)
            }
            Message::RestartGame => Some(ClientNotice::RestartRequested),
            Message::ApplyDebuff {
                debuff_type,
                duration,
                targetted_client,
            } => {
                if self.local_id.as_deref() == Some(targetted_client.as_str()) {
                    tetris.player_mut().apply_debuff(debuff_type, duration);
                    return Some(ClientNotice::DebuffReceived {
                        kind: debuff_type,
                        duration_ms: duration,
                    });
                }
                match self.peers.get_mut(&targetted_client) {
                    Some(mirror) => {
                        mirror.mark_debuff(debuff_type);
                        Some(ClientNotice::DebuffLanded {
                            target: targetted_client,
                            kind: debuff_type,
                        })
                    }
                    None => {
                        tracing::debug!(client = %targetted_client, "debuff for unknown client");
                        None
                    }
                }
            }
            Message::GoToSession { id } => Some(ClientNotice::GoToSession(id)),
            other => {
                tracing::warn!(msg_type = other.type_name(), "unexpected message from broker");
                None
            }
        }
    }

    /// Call after driving the local game. Reports the winner once when the
    /// local player's loss leaves a single participant playing.
    pub fn after_frame(&self, tetris: &Tetris) -> Option<ClientNotice> {
        if !self.local_ended.swap(false, Ordering::AcqRel) {
            return None;
        }
        self.winner(tetris.player()).map(ClientNotice::Winner)
    }

    /// The only participant still playing, local or remote
    pub fn winner(&self, local: &Player) -> Option<Winner> {
        let mut playing = self
            .peers
            .values()
            .filter(|p| !p.is_game_over())
            .map(|p| Winner {
                id: p.id().to_string(),
                name: p.name().to_string(),
                is_local: false,
            })
            .collect::<Vec<_>>();
        if !local.is_game_over() {
            playing.push(Winner {
                id: self.local_id.clone().unwrap_or_default(),
                name: local.name().to_string(),
                is_local: true,
            });
        }
        if playing.len() == 1 {
            playing.pop()
        } else {
            None
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn local_id(&self) -> Option<&str> {
        self.local_id.as_deref()
    }

    pub fn peer(&self, id: &str) -> Option<&PeerMirror> {
        self.peers.get(id)
    }

    pub fn peers(&self) -> impl Iterator<Item = &PeerMirror> {
        self.peers.values()
    }

    fn send(&self, msg: Message) {
        if let Err(e) = self.outbound.send(msg) {
            tracing::warn!(error = %e, "broker connection closed");
        }
    }

    fn update_roster(&mut self, roster: Roster) -> Option<ClientNotice> {
        let me = roster.you;
        let mut joined = Vec::new();
        for entry in roster.clients.iter().filter(|c| c.id != me) {
            if !self.peers.contains_key(&entry.id) {
                let mirror = PeerMirror::from_snapshot(entry.id.clone(), &entry.state);
                self.peers.insert(entry.id.clone(), mirror);
                joined.push(entry.id.clone());
            }
        }

        let left: Vec<ClientId> = self
            .peers
            .keys()
            .filter(|id| !roster.clients.iter().any(|c| &c.id == *id))
            .cloned()
            .collect();
        for id in &left {
            self.peers.remove(id);
        }

        self.local_id = Some(me);
        if joined.is_empty() && left.is_empty() {
            return None;
        }
        tracing::info!(joined = ?joined, left = ?left, "roster changed");
        Some(ClientNotice::RosterChanged { joined, left })
    }

    fn update_peer(
        &mut self,
        client_id: Option<ClientId>,
        fragment: Fragment,
        entry: Entry,
        tetris: &mut Tetris,
    ) -> Option<ClientNotice> {
        let Some(id) = client_id else {
            tracing::warn!("state update without clientId");
            return None;
        };
        let Some(mirror) = self.peers.get_mut(&id) else {
            tracing::warn!(client = %id, "state update for unknown client");
            return None;
        };
        let update = match PeerUpdate::try_from((fragment, entry)) {
            Ok(update) => update,
            Err(e) => {
                tracing::warn!(client = %id, error = %e, "dropping peer update");
                return None;
            }
        };

        let score_changed = matches!(update, PeerUpdate::Score(_));
        let ended = matches!(update, PeerUpdate::GameOver(true));
        mirror.apply(update);

        if score_changed {
            self.refresh_opponent_scores(tetris.player_mut());
        }
        if ended {
            return self.winner(tetris.player()).map(ClientNotice::Winner);
        }
        None
    }

    fn refresh_opponent_scores(&self, player: &mut Player) {
        let sum = self.peers.values().map(|p| p.score()).sum();
        player.set_opponent_score_sum(sum);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epic_tetris_adapter::protocol::{PeerEntry, StateSnapshot};

    fn roster(you: &str, ids: &[&str]) -> Message {
        Message::SessionBroadcast {
            peers: Roster {
                you: you.into(),
                clients: ids
                    .iter()
                    .map(|id| PeerEntry {
                        id: id.to_string(),
                        state: StateSnapshot::default(),
                    })
                    .collect(),
            },
        }
    }

    #[test]
    fn test_roster_adds_and_removes_mirrors() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut client = ReplicationClient::new(tx);
        let mut tetris = Tetris::new(1);

        let notice = client.receive(roster("me0000", &["me0000", "aaaaaa", "bbbbbb"]), &mut tetris);
        assert_eq!(
            notice,
            Some(ClientNotice::RosterChanged {
                joined: vec!["aaaaaa".into(), "bbbbbb".into()],
                left: vec![]
            })
        );
        assert_eq!(client.local_id(), Some("me0000"));
        assert!(client.peer("me0000").is_none());

        client.receive(roster("me0000", &["me0000", "bbbbbb"]), &mut tetris);
        assert!(client.peer("aaaaaa").is_none());
        assert!(client.peer("bbbbbb").is_some());
    }

    #[test]
    fn test_after_frame_is_quiet_while_playing() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let client = ReplicationClient::new(tx);
        let mut tetris = Tetris::new(1);
        client.watch(tetris.player_mut());

        tetris.start_with_countdown(0);
        tetris.frame(100);
        assert!(client.after_frame(&tetris).is_none());
    }

    #[test]
    fn test_event_message_skips_local_only_events() {
        assert!(event_message(&PlayerEvent::DebuffStarted(DebuffKind::Haste)).is_none());
        assert_eq!(
            event_message(&PlayerEvent::Score(30)),
            Some(Message::player_update(Entry::Score(30)))
        );
    }
}
