//! Typed peer updates
//!
//! A received `state-update` is converted into a [`PeerUpdate`] before it
//! touches a mirror. Fragment/property pairs that do not exist are rejected
//! here, so applying an update is a plain match.

use epic_tetris_adapter::protocol::Entry;
use epic_tetris_core::Piece;
use epic_tetris_types::{Cell, Fragment, Position};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpdateError {
    #[error("{prop:?} is not a property of the {fragment} fragment")]
    IllegalProperty {
        fragment: &'static str,
        prop: &'static str,
    },

    #[error("piece matrix must be a square of side 1..=4")]
    BadPiece,
}

/// Every legal change to a remote participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerUpdate {
    Position(Position),
    Score(u32),
    PlayerMatrix(Piece),
    ArenaMatrix(Vec<Vec<Cell>>),
    GameOver(bool),
    Name(String),
}

impl PeerUpdate {
    pub fn fragment(&self) -> Fragment {
        match self {
            PeerUpdate::ArenaMatrix(_) => Fragment::Arena,
            _ => Fragment::Player,
        }
    }

    /// Whether the mirror's board needs to be drawn again
    pub fn needs_redraw(&self) -> bool {
        !matches!(self, PeerUpdate::Score(_) | PeerUpdate::Name(_))
    }
}

impl TryFrom<(Fragment, Entry)> for PeerUpdate {
    type Error = UpdateError;

    fn try_from((fragment, entry): (Fragment, Entry)) -> Result<Self, Self::Error> {
        match (fragment, entry) {
            (Fragment::Player, Entry::Pos(p)) => Ok(PeerUpdate::Position(p.into())),
            (Fragment::Player, Entry::Score(s)) => Ok(PeerUpdate::Score(s)),
            (Fragment::Player, Entry::Matrix(rows)) => Piece::from_rows(&rows)
                .map(PeerUpdate::PlayerMatrix)
                .ok_or(UpdateError::BadPiece),
            (Fragment::Player, Entry::GameOver(v)) => Ok(PeerUpdate::GameOver(v)),
            (Fragment::Player, Entry::Name(n)) => Ok(PeerUpdate::Name(n)),
            (Fragment::Arena, Entry::Matrix(rows)) => Ok(PeerUpdate::ArenaMatrix(rows)),
            (fragment, entry) => Err(UpdateError::IllegalProperty {
                fragment: fragment.as_str(),
                prop: entry.prop(),
            }),
        }
    }
}
