//! Peer mirrors - local copies of remote participants
//!
//! A mirror never runs gravity or collision. It changes only when a
//! [`PeerUpdate`] arrives for it.

use epic_tetris_adapter::protocol::{ClientId, StateSnapshot};
use epic_tetris_core::{Arena, Piece};
use epic_tetris_types::{DebuffKind, Position};

use crate::update::PeerUpdate;

#[derive(Debug)]
pub struct PeerMirror {
    id: ClientId,
    arena: Arena,
    piece: Option<Piece>,
    pos: Position,
    score: u32,
    game_over: bool,
    name: String,
    redraws: u64,
    last_debuff: Option<DebuffKind>,
}

impl PeerMirror {
    /// Build a mirror from the snapshot carried by a roster entry
    pub fn from_snapshot(id: ClientId, state: &StateSnapshot) -> Self {
        Self {
            id,
            arena: Arena::from_rows(&state.arena.matrix),
            piece: Piece::from_rows(&state.player.matrix),
            pos: state.player.pos.into(),
            score: state.player.score,
            game_over: state.player.game_over,
            name: state.player.name.clone(),
            redraws: 0,
            last_debuff: None,
        }
    }

    pub fn apply(&mut self, update: PeerUpdate) {
        if update.needs_redraw() {
            self.redraws += 1;
        }
        match update {
            PeerUpdate::Position(pos) => self.pos = pos,
            PeerUpdate::Score(score) => self.score = score,
            PeerUpdate::PlayerMatrix(piece) => self.piece = Some(piece),
            PeerUpdate::ArenaMatrix(rows) => self.arena.load_rows(&rows),
            PeerUpdate::GameOver(v) => self.game_over = v,
            PeerUpdate::Name(name) => self.name = name,
        }
    }

    /// Remember the debuff that just landed on this participant
    pub fn mark_debuff(&mut self, kind: DebuffKind) {
        self.last_debuff = Some(kind);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn piece(&self) -> Option<&Piece> {
        self.piece.as_ref()
    }

    pub fn pos(&self) -> Position {
        self.pos
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of updates that changed what is drawn
    pub fn redraws(&self) -> u64 {
        self.redraws
    }

    pub fn last_debuff(&self) -> Option<DebuffKind> {
        self.last_debuff
    }
}
