//! Session store and message broker
//!
//! The broker groups connections into sessions, keeps the last known state
//! of every client, relays deltas between members and picks debuff targets.
//! It never simulates a game. It is transport-agnostic: each client is an
//! unbounded channel of [`Message`]s, drained by whatever owns the socket.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;

use crate::protocol::{ClientId, Message, PeerEntry, Roster, SessionId, StateSnapshot};

/// Length of generated client and session ids
pub const ID_LENGTH: usize = 6;

/// Characters used in generated ids
pub const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstwxyz123456789";

/// Outbound channel of one connection
pub type ClientSender = mpsc::UnboundedSender<Message>;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session {0} already exists")]
    AlreadyExists(SessionId),

    #[error("unknown client {0}")]
    UnknownClient(ClientId),

    #[error("client {0} is not in a session")]
    NotInSession(ClientId),
}

/// Random id drawn from [`ID_ALPHABET`]
pub fn create_id<R: Rng>(rng: &mut R) -> String {
    (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// A group of clients sharing one game; members are kept in join order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: SessionId,
    members: Vec<ClientId>,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            members: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn members(&self) -> &[ClientId] {
        &self.members
    }

    pub fn contains(&self, client: &str) -> bool {
        self.members.iter().any(|m| m == client)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    fn join(&mut self, client: &str) {
        if !self.contains(client) {
            self.members.push(client.to_string());
        }
    }

    fn leave(&mut self, client: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != client);
        self.members.len() != before
    }
}

/// Registry of live sessions
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<SessionId, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new empty session under `id`
    pub fn create(&mut self, id: SessionId) -> Result<&mut Session, SessionError> {
        if self.sessions.contains_key(&id) {
            return Err(SessionError::AlreadyExists(id));
        }
        tracing::info!(session = %id, "session created");
        Ok(self.sessions.entry(id.clone()).or_insert(Session::new(id)))
    }

    /// Existing session, or a new one. The flag is true when it was created.
    pub fn get_or_create(&mut self, id: &str) -> (&mut Session, bool) {
        let created = !self.sessions.contains_key(id);
        if created {
            tracing::info!(session = %id, "session created");
        }
        let session = self
            .sessions
            .entry(id.to_string())
            .or_insert_with(|| Session::new(id.to_string()));
        (session, created)
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Session> {
        let removed = self.sessions.remove(id);
        if removed.is_some() {
            tracing::info!(session = %id, "session destroyed");
        }
        removed
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Server-side handle of one connection
#[derive(Debug)]
struct Client {
    sender: ClientSender,
    session: Option<SessionId>,
    state: StateSnapshot,
}

/// Routes messages between connected clients
#[derive(Debug)]
pub struct Broker {
    store: SessionStore,
    clients: HashMap<ClientId, Client>,
    rng: StdRng,
}

impl Broker {
    pub fn new(store: SessionStore) -> Self {
        Self::with_rng(store, StdRng::from_entropy())
    }

    /// Broker with a fixed RNG (reproducible ids and debuff targets)
    pub fn with_rng(store: SessionStore, rng: StdRng) -> Self {
        Self {
            store,
            clients: HashMap::new(),
            rng,
        }
    }

    pub fn seeded(store: SessionStore, seed: u64) -> Self {
        Self::with_rng(store, StdRng::seed_from_u64(seed))
    }

    /// Register a connection and assign it an unused id
    pub fn connect(&mut self, sender: ClientSender) -> ClientId {
        let id = loop {
            let id = create_id(&mut self.rng);
            if !self.clients.contains_key(&id) {
                break id;
            }
        };
        tracing::info!(client = %id, "client connected");
        self.clients.insert(
            id.clone(),
            Client {
                sender,
                session: None,
                state: StateSnapshot::default(),
            },
        );
        id
    }

    /// Drop a connection, tearing down its session when it was the last member
    pub fn disconnect(&mut self, client: &str) -> Result<(), SessionError> {
        self.leave_current(client)?;
        self.clients.remove(client);
        tracing::info!(client = %client, "client disconnected");
        Ok(())
    }

    /// Process one message received from `client`
    pub fn handle(&mut self, client: &str, msg: Message) -> Result<(), SessionError> {
        if !self.clients.contains_key(client) {
            return Err(SessionError::UnknownClient(client.to_string()));
        }
        if msg.is_server_only() {
            tracing::warn!(
                client = %client,
                msg_type = msg.type_name(),
                "ignoring server-only message"
            );
            return Ok(());
        }

        match msg {
            Message::CreateSession { state } => {
                self.leave_current(client)?;
                let id = self.fresh_session_id();
                self.store.create(id.clone())?.join(client);
                self.attach(client, &id, state);
                self.send_to(client, Message::SessionCreated { id: id.clone() });
                self.broadcast_session(&id);
            }
            Message::JoinSession { id, state } => {
                self.leave_current(client)?;
                let (session, created) = self.store.get_or_create(&id);
                session.join(client);
                self.attach(client, &id, state);
                if created {
                    self.send_to(client, Message::SessionCreated { id: id.clone() });
                }
                self.broadcast_session(&id);
            }
            Message::StateUpdate {
                fragment, entry, ..
            } => {
                let session = self.session_of_client(client)?;
                if let Some(c) = self.clients.get_mut(client) {
                    if let Err(e) = c.state.apply(fragment, &entry) {
                        tracing::warn!(client = %client, error = %e, "dropping state update");
                        return Ok(());
                    }
                }
                tracing::debug!(
                    client = %client,
                    fragment = fragment.as_str(),
                    prop = entry.prop(),
                    "relaying state update"
                );
                let relay = Message::StateUpdate {
                    fragment,
                    entry,
                    client_id: Some(client.to_string()),
                };
                self.broadcast_except(&session, client, &relay);
            }
            Message::StartGame => {
                let session = self.session_of_client(client)?;
                tracing::info!(session = %session, client = %client, "game started");
                self.broadcast(&session, &Message::StartGame);
            }
            Message::RestartGame => {
                let session = self.session_of_client(client)?;
                tracing::info!(session = %session, client = %client, "game restarted");
                self.broadcast(&session, &Message::RestartGame);
                let id = self.fresh_session_id();
                self.broadcast(&session, &Message::GoToSession { id });
            }
            Message::SendDebuff {
                debuff_type,
                duration,
            } => {
                let session = self.session_of_client(client)?;
                match self.pick_debuff_target(&session, client) {
                    Some(target) => {
                        tracing::debug!(
                            session = %session,
                            from = %client,
                            to = %target,
                            debuff = debuff_type.as_str(),
                            "debuff dispatched"
                        );
                        let msg = Message::ApplyDebuff {
                            debuff_type,
                            duration,
                            targetted_client: target,
                        };
                        self.broadcast(&session, &msg);
                    }
                    None => {
                        tracing::debug!(session = %session, from = %client, "no debuff target");
                    }
                }
            }
            // filtered above
            Message::SessionCreated { .. }
            | Message::SessionBroadcast { .. }
            | Message::ApplyDebuff { .. }
            | Message::GoToSession { .. } => {}
        }
        Ok(())
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Session the client currently belongs to
    pub fn session_of(&self, client: &str) -> Option<&str> {
        self.clients.get(client)?.session.as_deref()
    }

    /// Last known state of a client
    pub fn client_state(&self, client: &str) -> Option<&StateSnapshot> {
        self.clients.get(client).map(|c| &c.state)
    }

    fn session_of_client(&self, client: &str) -> Result<SessionId, SessionError> {
        self.clients
            .get(client)
            .ok_or_else(|| SessionError::UnknownClient(client.to_string()))?
            .session
            .clone()
            .ok_or_else(|| SessionError::NotInSession(client.to_string()))
    }

    fn attach(&mut self, client: &str, session: &str, state: StateSnapshot) {
        if let Some(c) = self.clients.get_mut(client) {
            c.session = Some(session.to_string());
            c.state = state;
        }
    }

    /// Leave the current session, if any
    fn leave_current(&mut self, client: &str) -> Result<(), SessionError> {
        let c = self
            .clients
            .get_mut(client)
            .ok_or_else(|| SessionError::UnknownClient(client.to_string()))?;
        let Some(id) = c.session.take() else {
            return Ok(());
        };

        let now_empty = match self.store.get_mut(&id) {
            Some(session) => {
                session.leave(client);
                session.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.store.remove(&id);
        } else {
            self.broadcast_session(&id);
        }
        Ok(())
    }

    fn fresh_session_id(&mut self) -> SessionId {
        loop {
            let id = create_id(&mut self.rng);
            if !self.store.contains(&id) {
                return id;
            }
        }
    }

    /// Uniformly pick another member still playing
    fn pick_debuff_target(&mut self, session: &str, sender: &str) -> Option<ClientId> {
        let members = self.store.get(session)?.members();
        let candidates: Vec<&ClientId> = members
            .iter()
            .filter(|m| m.as_str() != sender)
            .filter(|m| {
                self.clients
                    .get(m.as_str())
                    .map(|c| !c.state.player.game_over)
                    .unwrap_or(true)
            })
            .collect();
        candidates.choose(&mut self.rng).map(|id| (*id).clone())
    }

    fn send_to(&self, client: &str, msg: Message) {
        if let Some(c) = self.clients.get(client) {
            if let Err(e) = c.sender.send(msg) {
                tracing::warn!(client = %client, error = %e, "send failed");
            }
        }
    }

    fn broadcast(&self, session: &str, msg: &Message) {
        let Some(session) = self.store.get(session) else {
            return;
        };
        for member in session.members() {
            self.send_to(member, msg.clone());
        }
    }

    fn broadcast_except(&self, session: &str, exclude: &str, msg: &Message) {
        let Some(session) = self.store.get(session) else {
            return;
        };
        for member in session.members().iter().filter(|m| m.as_str() != exclude) {
            self.send_to(member, msg.clone());
        }
    }

    /// Send every member the roster, each with its own `you`
    fn broadcast_session(&self, session: &str) {
        let Some(session) = self.store.get(session) else {
            return;
        };
        let clients: Vec<PeerEntry> = session
            .members()
            .iter()
            .map(|id| PeerEntry {
                id: id.clone(),
                state: self
                    .clients
                    .get(id)
                    .map(|c| c.state.clone())
                    .unwrap_or_default(),
            })
            .collect();

        for member in session.members() {
            let peers = Roster {
                you: member.clone(),
                clients: clients.clone(),
            };
            self.send_to(member, Message::SessionBroadcast { peers });
        }
    }
}
