//! Player module - the per-participant simulation
//!
//! A player owns its arena, the falling piece, score, gravity timer and
//! active debuffs. Every externally visible change is published on the
//! player's event bus so the replication layer can forward it.
//!
//! Two states are observable: falling and game over. Game over is terminal;
//! once set, every mutating operation is a no-op.

use crate::arena::Arena;
use crate::debuff::DebuffSet;
use crate::events::{BusEvent, EventBus};
use crate::pieces::Piece;
use crate::rng::PieceGenerator;
use crate::types::{
    debuff_duration_ms, DebuffKind, GameAction, Position, ARENA_WIDTH, DROP_FAST_MS,
    DROP_INTERVAL_MIN_MS, DROP_SLOW_MS, HASTE_FACTOR,
};

/// State changes published by a [`Player`]
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Pos(Position),
    Matrix(Piece),
    Score(u32),
    GameOver(bool),
    Name(String),
    /// Rows were cleared; an opponent should receive this debuff
    SendDebuff { kind: DebuffKind, duration_ms: u32 },
    DebuffStarted(DebuffKind),
    DebuffEnded(DebuffKind),
    StartGame,
    RestartGame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEventKind {
    Pos,
    Matrix,
    Score,
    GameOver,
    Name,
    SendDebuff,
    DebuffStarted,
    DebuffEnded,
    StartGame,
    RestartGame,
}

impl BusEvent for PlayerEvent {
    type Kind = PlayerEventKind;

    fn kind(&self) -> PlayerEventKind {
        match self {
            PlayerEvent::Pos(_) => PlayerEventKind::Pos,
            PlayerEvent::Matrix(_) => PlayerEventKind::Matrix,
            PlayerEvent::Score(_) => PlayerEventKind::Score,
            PlayerEvent::GameOver(_) => PlayerEventKind::GameOver,
            PlayerEvent::Name(_) => PlayerEventKind::Name,
            PlayerEvent::SendDebuff { .. } => PlayerEventKind::SendDebuff,
            PlayerEvent::DebuffStarted(_) => PlayerEventKind::DebuffStarted,
            PlayerEvent::DebuffEnded(_) => PlayerEventKind::DebuffEnded,
            PlayerEvent::StartGame => PlayerEventKind::StartGame,
            PlayerEvent::RestartGame => PlayerEventKind::RestartGame,
        }
    }
}

#[derive(Debug)]
pub struct Player {
    arena: Arena,
    piece: Piece,
    pos: Position,
    score: u32,
    /// Gravity period without soft drop or haste
    base_interval_ms: u32,
    soft_drop: bool,
    drop_counter_ms: u32,
    /// Simulation clock, advanced only by `update`
    clock_ms: u64,
    game_over: bool,
    name: String,
    debuffs: DebuffSet,
    opponent_score_sum: u32,
    rows_cleared: u32,
    generator: PieceGenerator,
    events: EventBus<PlayerEvent>,
}

impl Player {
    /// Create a player with an empty arena and a freshly spawned piece
    pub fn new(seed: u32) -> Self {
        let mut player = Self {
            arena: Arena::new(),
            piece: Piece::default(),
            pos: Position::default(),
            score: 0,
            base_interval_ms: DROP_SLOW_MS,
            soft_drop: false,
            drop_counter_ms: 0,
            clock_ms: 0,
            game_over: false,
            name: String::new(),
            debuffs: DebuffSet::new(),
            opponent_score_sum: 0,
            rows_cleared: 0,
            generator: PieceGenerator::new(seed),
            events: EventBus::new(),
        };
        player.reset();
        player
    }

    /// Shift horizontally by `dir` columns; reverted if it would collide
    pub fn move_by(&mut self, dir: i8) -> bool {
        if self.game_over {
            return false;
        }
        self.pos.x += dir;
        if self.arena.collide(&self.piece, self.pos) {
            self.pos.x -= dir;
            return false;
        }
        self.emit(PlayerEvent::Pos(self.pos));
        true
    }

    /// Rotate with kick search.
    ///
    /// While the rotated piece collides, x is shifted by +1, -2, +3, -4, ...
    /// (cumulative). Once the next offset would exceed the piece width the
    /// rotation is undone and x restored. Returns whether the piece rotated.
    pub fn rotate(&mut self, dir: i8) -> bool {
        if self.game_over {
            return false;
        }
        let initial_x = self.pos.x;
        let width = self.piece.size() as i8;
        let mut offset: i8 = 1;

        self.piece.rotate(dir);
        while self.arena.collide(&self.piece, self.pos) {
            self.pos.x += offset;
            offset = -(offset + offset.signum());
            if offset > width {
                self.piece.rotate(-dir);
                self.pos.x = initial_x;
                return false;
            }
        }

        self.emit(PlayerEvent::Matrix(self.piece));
        true
    }

    /// Advance one row. Returns true when the piece locked.
    pub fn drop(&mut self) -> bool {
        if self.game_over {
            return false;
        }
        self.drop_counter_ms = 0;
        self.pos.y += 1;
        if self.rotating_pieces() {
            self.rotate(1);
        }

        if !self.arena.collide(&self.piece, self.pos) {
            self.emit(PlayerEvent::Pos(self.pos));
            return false;
        }

        self.pos.y -= 1;
        self.soft_drop = false;
        self.arena.merge(&self.piece, self.pos);

        let sweep = self.arena.sweep();
        self.score += sweep.score;
        self.rows_cleared += sweep.rows_cleared as u32;
        self.change_speed();

        if sweep.rows_cleared > 0 {
            let kind = self.generator.rng_mut().pick(&DebuffKind::ALL);
            let duration_ms = debuff_duration_ms(sweep.rows_cleared);
            tracing::debug!(
                rows = sweep.rows_cleared,
                debuff = kind.as_str(),
                duration_ms,
                "rows cleared"
            );
            self.emit(PlayerEvent::SendDebuff { kind, duration_ms });
        }

        self.emit(PlayerEvent::Score(self.score));
        self.reset();
        true
    }

    /// Drop until the current piece locks
    pub fn hard_drop(&mut self) {
        while !self.game_over && !self.drop() {}
    }

    /// Spawn the next piece at the top center.
    ///
    /// If the spawn position is already occupied the game is over.
    pub fn reset(&mut self) {
        if self.game_over {
            return;
        }
        self.piece = self.generator.next(self.random_pieces());
        self.pos = Position::new(
            (ARENA_WIDTH / 2) as i8 - (self.piece.size() / 2) as i8,
            0,
        );

        if self.arena.collide(&self.piece, self.pos) {
            self.game_over = true;
            tracing::info!(name = %self.name, score = self.score, "game over");
            self.emit(PlayerEvent::GameOver(true));
        }

        self.emit(PlayerEvent::Pos(self.pos));
        self.emit(PlayerEvent::Matrix(self.piece));
    }

    /// Advance the simulation clock by `delta_ms`
    pub fn update(&mut self, delta_ms: u32) {
        if self.game_over {
            return;
        }
        self.clock_ms += u64::from(delta_ms);
        for kind in self.debuffs.reap(self.clock_ms) {
            tracing::debug!(debuff = kind.as_str(), "debuff ended");
            self.emit(PlayerEvent::DebuffEnded(kind));
        }

        self.drop_counter_ms += delta_ms;
        if self.drop_counter_ms > self.drop_interval_ms() {
            self.drop();
        }
    }

    /// Press (true) or release (false) soft drop.
    ///
    /// Pressing switches to the fast period and drops one row immediately.
    pub fn set_soft_drop(&mut self, active: bool) {
        if self.game_over {
            return;
        }
        if active && !self.soft_drop {
            self.soft_drop = true;
            self.drop();
        } else if !active {
            self.soft_drop = false;
        }
    }

    /// Apply one input action, honoring KEYS-INVERTED
    pub fn apply_action(&mut self, action: GameAction) {
        if self.game_over {
            return;
        }
        let action = if self.inverted_keys() {
            action.inverted()
        } else {
            action
        };
        match action {
            GameAction::MoveLeft => {
                self.move_by(-1);
            }
            GameAction::MoveRight => {
                self.move_by(1);
            }
            GameAction::RotateCw => {
                self.rotate(1);
            }
            GameAction::RotateCcw => {
                self.rotate(-1);
            }
            GameAction::SoftDrop => self.set_soft_drop(true),
            GameAction::SoftDropRelease => self.set_soft_drop(false),
            GameAction::HardDrop => self.hard_drop(),
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        let event = PlayerEvent::Name(self.name.clone());
        self.emit(event);
    }

    pub fn request_start(&mut self) {
        self.emit(PlayerEvent::StartGame);
    }

    pub fn request_restart(&mut self) {
        self.emit(PlayerEvent::RestartGame);
    }

    /// Record the sum of every other participant's score
    pub fn set_opponent_score_sum(&mut self, sum: u32) {
        self.opponent_score_sum = sum;
    }

    /// Recompute the base gravity period from the opponents' scores
    pub fn change_speed(&mut self) {
        self.base_interval_ms = DROP_SLOW_MS
            .saturating_sub(self.opponent_score_sum / 2)
            .max(DROP_INTERVAL_MIN_MS);
    }

    /// Start (or refresh) a debuff for `duration_ms` of simulation time
    pub fn apply_debuff(&mut self, kind: DebuffKind, duration_ms: u32) {
        if self.game_over {
            return;
        }
        if self.debuffs.apply(kind, self.clock_ms, duration_ms) {
            tracing::debug!(debuff = kind.as_str(), duration_ms, "debuff started");
            self.emit(PlayerEvent::DebuffStarted(kind));
        }
    }

    /// Place a specific piece, bypassing the generator
    pub fn set_piece(&mut self, piece: Piece, pos: Position) {
        self.piece = piece;
        self.pos = pos;
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    pub fn piece(&self) -> &Piece {
        &self.piece
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

    pub fn rows_cleared(&self) -> u32 {
        self.rows_cleared
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn opponent_score_sum(&self) -> u32 {
        self.opponent_score_sum
    }

    pub fn is_soft_dropping(&self) -> bool {
        self.soft_drop
    }

    pub fn debuffs(&self) -> &DebuffSet {
        &self.debuffs
    }

    pub fn has_debuff(&self, kind: DebuffKind) -> bool {
        self.debuffs.is_active(kind)
    }

    pub fn inverted_keys(&self) -> bool {
        self.has_debuff(DebuffKind::KeysInverted)
    }

    pub fn rotating_pieces(&self) -> bool {
        self.has_debuff(DebuffKind::RotatingPiece)
    }

    pub fn random_pieces(&self) -> bool {
        self.has_debuff(DebuffKind::RandomPieces)
    }

    /// Base period before soft drop and haste
    pub fn base_interval_ms(&self) -> u32 {
        self.base_interval_ms
    }

    /// Fast period, halved while HASTE is active
    pub fn drop_fast_ms(&self) -> u32 {
        self.hasted(DROP_FAST_MS)
    }

    /// Gravity period currently in effect
    pub fn drop_interval_ms(&self) -> u32 {
        if self.soft_drop {
            self.drop_fast_ms()
        } else {
            self.hasted(self.base_interval_ms)
        }
    }

    pub fn events_mut(&mut self) -> &mut EventBus<PlayerEvent> {
        &mut self.events
    }

    fn hasted(&self, interval_ms: u32) -> u32 {
        if self.has_debuff(DebuffKind::Haste) {
            interval_ms / HASTE_FACTOR
        } else {
            interval_ms
        }
    }

    fn emit(&mut self, event: PlayerEvent) {
        self.events.emit(&event);
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new(1)
    }
}
