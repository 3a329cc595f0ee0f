//! Protocol module - JSON message types for session replication
//!
//! Every frame is one JSON object tagged by `type` (kebab-case). State deltas
//! carry an `entry` shaped `[prop, value]`, decoded into the closed [`Entry`]
//! enum so a receiver never patches fields by name.

use serde::{Deserialize, Serialize};

use crate::core::Player;
use crate::types::{debuff_duration_ms, Cell, DebuffKind, Fragment, Position};

/// Connection id assigned by the broker
pub type ClientId = String;

/// Session id, shared through the page URL in the browser client
pub type SessionId = String;

/// Errors raised while decoding or applying protocol frames
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unknown message type {0:?}")]
    UnknownType(String),

    #[error("{prop:?} is not a property of the {fragment} fragment")]
    IllegalEntry {
        fragment: &'static str,
        prop: &'static str,
    },
}

// ============== State snapshot ==============

/// Wire form of [`Position`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pos {
    pub x: i8,
    pub y: i8,
}

impl From<Position> for Pos {
    fn from(p: Position) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<Pos> for Position {
    fn from(p: Pos) -> Self {
        Position::new(p.x, p.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArenaState {
    pub matrix: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerState {
    pub matrix: Vec<Vec<Cell>>,
    pub pos: Pos,
    pub score: u32,
    #[serde(rename = "gameOver")]
    pub game_over: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

/// Full serialized state of one participant
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub arena: ArenaState,
    pub player: PlayerState,
}

impl StateSnapshot {
    /// Merge one delta into the snapshot
    pub fn apply(&mut self, fragment: Fragment, entry: &Entry) -> Result<(), ProtocolError> {
        match (fragment, entry) {
            (Fragment::Player, Entry::Pos(pos)) => self.player.pos = *pos,
            (Fragment::Player, Entry::Score(score)) => self.player.score = *score,
            (Fragment::Player, Entry::Matrix(m)) => self.player.matrix = m.clone(),
            (Fragment::Player, Entry::GameOver(v)) => self.player.game_over = *v,
            (Fragment::Player, Entry::Name(name)) => self.player.name = name.clone(),
            (Fragment::Arena, Entry::Matrix(m)) => self.arena.matrix = m.clone(),
            (fragment, entry) => {
                return Err(ProtocolError::IllegalEntry {
                    fragment: fragment.as_str(),
                    prop: entry.prop(),
                })
            }
        }
        Ok(())
    }
}

/// Snapshot of a local player, sent with create/join
pub fn build_state(player: &Player) -> StateSnapshot {
    StateSnapshot {
        arena: ArenaState {
            matrix: player.arena().rows(),
        },
        player: PlayerState {
            matrix: player.piece().rows(),
            pos: player.pos().into(),
            score: player.score(),
            game_over: player.is_game_over(),
            name: player.name().to_string(),
        },
    }
}

// ============== State delta entry ==============

/// One `[prop, value]` pair of a `state-update`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Pos(Pos),
    Score(u32),
    Matrix(Vec<Vec<Cell>>),
    GameOver(bool),
    Name(String),
}

impl Entry {
    pub fn prop(&self) -> &'static str {
        match self {
            Entry::Pos(_) => "pos",
            Entry::Score(_) => "score",
            Entry::Matrix(_) => "matrix",
            Entry::GameOver(_) => "gameOver",
            Entry::Name(_) => "name",
        }
    }
}

impl Serialize for Entry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeTuple;
        let mut tup = serializer.serialize_tuple(2)?;
        tup.serialize_element(self.prop())?;
        match self {
            Entry::Pos(v) => tup.serialize_element(v)?,
            Entry::Score(v) => tup.serialize_element(v)?,
            Entry::Matrix(v) => tup.serialize_element(v)?,
            Entry::GameOver(v) => tup.serialize_element(v)?,
            Entry::Name(v) => tup.serialize_element(v)?,
        }
        tup.end()
    }
}

impl<'de> Deserialize<'de> for Entry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;
        impl<'de> serde::de::Visitor<'de> for V {
            type Value = Entry;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "a [prop, value] pair")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                use serde::de::Error;

                let prop: String = seq
                    .next_element()?
                    .ok_or_else(|| A::Error::invalid_length(0, &self))?;
                let missing = || A::Error::invalid_length(1, &"a [prop, value] pair");
                let entry = match prop.as_str() {
                    "pos" => Entry::Pos(seq.next_element()?.ok_or_else(missing)?),
                    "score" => Entry::Score(seq.next_element()?.ok_or_else(missing)?),
                    "matrix" => Entry::Matrix(seq.next_element()?.ok_or_else(missing)?),
                    "gameOver" => Entry::GameOver(seq.next_element()?.ok_or_else(missing)?),
                    "name" => Entry::Name(seq.next_element()?.ok_or_else(missing)?),
                    other => {
                        return Err(A::Error::unknown_variant(
                            other,
                            &["pos", "score", "matrix", "gameOver", "name"],
                        ))
                    }
                };
                if seq.next_element::<serde::de::IgnoredAny>()?.is_some() {
                    return Err(A::Error::invalid_length(3, &self));
                }
                Ok(entry)
            }
        }

        deserializer.deserialize_seq(V)
    }
}

// ============== Messages ==============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerEntry {
    pub id: ClientId,
    #[serde(default)]
    pub state: StateSnapshot,
}

/// Session roster as seen by one member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub you: ClientId,
    pub clients: Vec<PeerEntry>,
}

fn default_debuff_duration() -> u32 {
    debuff_duration_ms(2)
}

/// Every frame exchanged between clients and the broker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Message {
    // Client -> Server
    CreateSession {
        #[serde(default)]
        state: StateSnapshot,
    },
    JoinSession {
        id: SessionId,
        #[serde(default)]
        state: StateSnapshot,
    },
    SendDebuff {
        #[serde(rename = "debuffType", with = "debuff_name")]
        debuff_type: DebuffKind,
        #[serde(default = "default_debuff_duration")]
        duration: u32,
    },

    // Both directions
    StateUpdate {
        #[serde(with = "fragment_name")]
        fragment: Fragment,
        entry: Entry,
        #[serde(
            rename = "clientId",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        client_id: Option<ClientId>,
    },
    StartGame,
    RestartGame,

    // Server -> Client
    SessionCreated {
        id: SessionId,
    },
    SessionBroadcast {
        peers: Roster,
    },
    ApplyDebuff {
        #[serde(rename = "debuffType", with = "debuff_name")]
        debuff_type: DebuffKind,
        duration: u32,
        #[serde(rename = "targettedClient")]
        targetted_client: ClientId,
    },
    GoToSession {
        id: SessionId,
    },
}

impl Message {
    /// Wire `type` tag
    pub fn type_name(&self) -> &'static str {
        match self {
            Message::CreateSession { .. } => "create-session",
            Message::JoinSession { .. } => "join-session",
            Message::SendDebuff { .. } => "send-debuff",
            Message::StateUpdate { .. } => "state-update",
            Message::StartGame => "start-game",
            Message::RestartGame => "restart-game",
            Message::SessionCreated { .. } => "session-created",
            Message::SessionBroadcast { .. } => "session-broadcast",
            Message::ApplyDebuff { .. } => "apply-debuff",
            Message::GoToSession { .. } => "go-to-session",
        }
    }

    /// Messages only the broker may originate
    pub fn is_server_only(&self) -> bool {
        matches!(
            self,
            Message::SessionCreated { .. }
                | Message::SessionBroadcast { .. }
                | Message::ApplyDebuff { .. }
                | Message::GoToSession { .. }
        )
    }

    /// Shorthand for an unstamped player-fragment delta
    pub fn player_update(entry: Entry) -> Self {
        Message::StateUpdate {
            fragment: Fragment::Player,
            entry,
            client_id: None,
        }
    }

    /// Shorthand for an unstamped arena-fragment delta
    pub fn arena_update(matrix: Vec<Vec<Cell>>) -> Self {
        Message::StateUpdate {
            fragment: Fragment::Arena,
            entry: Entry::Matrix(matrix),
            client_id: None,
        }
    }
}

const MESSAGE_TYPES: [&str; 10] = [
    "create-session",
    "join-session",
    "send-debuff",
    "state-update",
    "start-game",
    "restart-game",
    "session-created",
    "session-broadcast",
    "apply-debuff",
    "go-to-session",
];

/// Parse one incoming JSON frame
pub fn parse_message(json: &str) -> Result<Message, ProtocolError> {
    match serde_json::from_str::<Message>(json) {
        Ok(msg) => Ok(msg),
        Err(e) => {
            #[derive(Debug, Deserialize)]
            struct TypeOnly {
                #[serde(rename = "type")]
                msg_type: Option<String>,
            }
            let msg_type = serde_json::from_str::<TypeOnly>(json)?.msg_type;
            match msg_type {
                Some(t) if !MESSAGE_TYPES.contains(&t.as_str()) => {
                    Err(ProtocolError::UnknownType(t))
                }
                _ => Err(ProtocolError::Malformed(e)),
            }
        }
    }
}

/// Serialize one outgoing frame
pub fn encode_message(msg: &Message) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(msg)?)
}

mod debuff_name {
    use super::DebuffKind;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(kind: &DebuffKind, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(kind.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DebuffKind, D::Error> {
        let name = String::deserialize(d)?;
        DebuffKind::from_str(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown debuff {name:?}")))
    }
}

mod fragment_name {
    use super::Fragment;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(fragment: &Fragment, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(fragment.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Fragment, D::Error> {
        let name = String::deserialize(d)?;
        Fragment::from_str(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown fragment {name:?}")))
    }
}
