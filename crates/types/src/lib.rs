//! Shared types and constants for Epic Tetris.
//!
//! This crate is dependency-free so that the simulation core, the wire
//! protocol and the replication layer can agree on one vocabulary.

/// Arena width in cells
pub const ARENA_WIDTH: u8 = 12;

/// Arena height in cells
pub const ARENA_HEIGHT: u8 = 20;

/// Frame period used by headless loops (approximately 60 FPS)
pub const TICK_MS: u32 = 16;

/// Base gravity period before any dynamic difficulty adjustment
pub const DROP_SLOW_MS: u32 = 700;

/// Gravity period while the soft drop key is held
pub const DROP_FAST_MS: u32 = 35;

/// Lower bound for the base gravity period
pub const DROP_INTERVAL_MIN_MS: u32 = 100;

/// Divisor applied to both gravity periods while HASTE is active
pub const HASTE_FACTOR: u32 = 2;

/// Countdown between `start-game` and the first simulated frame
pub const START_COUNTDOWN_MS: u32 = 7000;

/// Points for the first row cleared in one sweep; each further row doubles it
pub const ROW_SCORE_BASE: u32 = 10;

/// Debuff duration indexed by rows cleared in a single lock.
///
/// Anything past the end of the table uses the last entry.
pub const DEBUFF_DURATIONS_MS: [u32; 5] = [0, 5000, 10000, 15000, 20000];

/// Arena cell: 0 is empty, 1..=7 is a color id
pub type Cell = u8;

/// Number of distinct block colors
pub const COLOR_COUNT: u8 = 7;

/// Debuff duration for a lock that cleared `rows` rows
pub fn debuff_duration_ms(rows: usize) -> u32 {
    let last = DEBUFF_DURATIONS_MS.len() - 1;
    DEBUFF_DURATIONS_MS[rows.min(last)]
}

/// Top-left offset of the active piece within the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub x: i8,
    pub y: i8,
}

impl Position {
    pub fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::L,
        PieceKind::J,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
    ];

    /// Color id written into the arena for this piece
    pub fn color(&self) -> Cell {
        match self {
            PieceKind::Z => 1,
            PieceKind::S => 2,
            PieceKind::I => 3,
            PieceKind::J => 4,
            PieceKind::L => 5,
            PieceKind::O => 6,
            PieceKind::T => 7,
        }
    }
}

/// Timed adverse effects one player can inflict on another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DebuffKind {
    /// Both gravity periods divided by [`HASTE_FACTOR`]
    Haste,
    /// Left/right and rotate/soft-drop controls swapped
    KeysInverted,
    /// Presentational: the arena sways
    ArenaSwing,
    /// Every gravity step also rotates the piece
    RotatingPiece,
    /// Spawned pieces are random 3x3 block layouts
    RandomPieces,
    /// Presentational: the arena is drawn smaller
    ArenaMini,
}

impl DebuffKind {
    pub const ALL: [DebuffKind; 6] = [
        DebuffKind::Haste,
        DebuffKind::KeysInverted,
        DebuffKind::ArenaSwing,
        DebuffKind::RotatingPiece,
        DebuffKind::RandomPieces,
        DebuffKind::ArenaMini,
    ];

    /// Parse the wire name of a debuff
    ///
    /// # Examples
    ///
    /// ```
    /// use epic_tetris_types::DebuffKind;
    ///
    /// assert_eq!(DebuffKind::from_str("HASTE"), Some(DebuffKind::Haste));
    /// assert_eq!(DebuffKind::from_str("keys-inverted"), Some(DebuffKind::KeysInverted));
    /// assert_eq!(DebuffKind::from_str("SLOW"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "HASTE" => Some(DebuffKind::Haste),
            "KEYS-INVERTED" => Some(DebuffKind::KeysInverted),
            "ARENA-SWING" => Some(DebuffKind::ArenaSwing),
            "ROTATING-PIECE" => Some(DebuffKind::RotatingPiece),
            "RANDOM-PIECES" => Some(DebuffKind::RandomPieces),
            "ARENA-MINI" => Some(DebuffKind::ArenaMini),
            _ => None,
        }
    }

    /// Wire name of the debuff
    pub fn as_str(&self) -> &'static str {
        match self {
            DebuffKind::Haste => "HASTE",
            DebuffKind::KeysInverted => "KEYS-INVERTED",
            DebuffKind::ArenaSwing => "ARENA-SWING",
            DebuffKind::RotatingPiece => "ROTATING-PIECE",
            DebuffKind::RandomPieces => "RANDOM-PIECES",
            DebuffKind::ArenaMini => "ARENA-MINI",
        }
    }
}

/// Player input, after key mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    /// Move piece one cell left
    MoveLeft,
    /// Move piece one cell right
    MoveRight,
    /// Rotate piece clockwise
    RotateCw,
    /// Rotate piece counter-clockwise
    RotateCcw,
    /// Switch to the fast gravity period and drop one row
    SoftDrop,
    /// Back to the base gravity period
    SoftDropRelease,
    /// Drop until the piece locks
    HardDrop,
}

impl GameAction {
    /// Action produced by the same key while KEYS-INVERTED is active
    ///
    /// # Examples
    ///
    /// ```
    /// use epic_tetris_types::GameAction;
    ///
    /// assert_eq!(GameAction::MoveLeft.inverted(), GameAction::MoveRight);
    /// assert_eq!(GameAction::RotateCw.inverted(), GameAction::SoftDrop);
    /// assert_eq!(GameAction::HardDrop.inverted(), GameAction::HardDrop);
    /// ```
    pub fn inverted(self) -> Self {
        match self {
            GameAction::MoveLeft => GameAction::MoveRight,
            GameAction::MoveRight => GameAction::MoveLeft,
            GameAction::RotateCw => GameAction::SoftDrop,
            GameAction::SoftDrop => GameAction::RotateCw,
            other => other,
        }
    }
}

/// Top-level replicated sub-object a state delta belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fragment {
    Player,
    Arena,
}

impl Fragment {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "player" => Some(Fragment::Player),
            "arena" => Some(Fragment::Arena),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Fragment::Player => "player",
            Fragment::Arena => "arena",
        }
    }
}
