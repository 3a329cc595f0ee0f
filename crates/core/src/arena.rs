//! Arena module - the settled-block grid of one player
//!
//! The arena is a 12x20 grid where each cell is 0 (empty) or a color id.
//! Uses a flat array for better cache locality and zero-allocation.
//! Coordinates: (x, y) where x ranges 0..11 (left to right), y ranges 0..19 (top to bottom)

use arrayvec::ArrayVec;

use crate::events::{BusEvent, EventBus};
use crate::pieces::Piece;
use crate::types::{Cell, Position, ARENA_HEIGHT, ARENA_WIDTH, ROW_SCORE_BASE};

/// Total number of cells in the arena
const ARENA_SIZE: usize = (ARENA_WIDTH as usize) * (ARENA_HEIGHT as usize);

/// Notifications emitted by the arena
#[derive(Debug, Clone, PartialEq)]
pub enum ArenaEvent {
    /// The grid changed; carries the full grid as rows
    Matrix(Vec<Vec<Cell>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaEventKind {
    Matrix,
}

impl BusEvent for ArenaEvent {
    type Kind = ArenaEventKind;

    fn kind(&self) -> ArenaEventKind {
        match self {
            ArenaEvent::Matrix(_) => ArenaEventKind::Matrix,
        }
    }
}

/// Outcome of a sweep
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SweepResult {
    pub score: u32,
    pub rows_cleared: usize,
    /// Pre-sweep indices of the removed rows, bottom to top
    pub cleared_rows: ArrayVec<usize, { ARENA_HEIGHT as usize }>,
}

/// Points for clearing `rows` rows in one sweep: 10, 30, 70, 150, ...
pub fn sweep_score(rows: usize) -> u32 {
    let mut score = 0;
    let mut multiplier = 1;
    for _ in 0..rows {
        score += multiplier * ROW_SCORE_BASE;
        multiplier *= 2;
    }
    score
}

/// The arena - 12 columns x 20 rows using flat array storage
pub struct Arena {
    /// Flat array of cells, row-major order (y * WIDTH + x)
    cells: [Cell; ARENA_SIZE],
    events: EventBus<ArenaEvent>,
}

impl Arena {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self {
            cells: [0; ARENA_SIZE],
            events: EventBus::new(),
        }
    }

    /// Build an arena from row vectors (e.g. a received snapshot).
    ///
    /// Missing rows/columns stay empty; extra ones are ignored.
    pub fn from_rows<R: AsRef<[Cell]>>(rows: &[R]) -> Self {
        let mut arena = Self::new();
        arena.load_rows(rows);
        arena
    }

    /// Overwrite the grid from row vectors without emitting events
    pub fn load_rows<R: AsRef<[Cell]>>(&mut self, rows: &[R]) {
        self.cells = [0; ARENA_SIZE];
        let width = ARENA_WIDTH as usize;
        for (y, row) in rows.iter().take(ARENA_HEIGHT as usize).enumerate() {
            for (x, &cell) in row.as_ref().iter().take(width).enumerate() {
                self.cells[y * width + x] = cell;
            }
        }
    }

    /// Calculate flat index from (x, y) coordinates
    #[inline(always)]
    fn index(x: i8, y: i8) -> Option<usize> {
        if x < 0 || x >= ARENA_WIDTH as i8 || y < 0 || y >= ARENA_HEIGHT as i8 {
            return None;
        }
        Some((y as usize) * (ARENA_WIDTH as usize) + (x as usize))
    }

    pub fn width(&self) -> u8 {
        ARENA_WIDTH
    }

    pub fn height(&self) -> u8 {
        ARENA_HEIGHT
    }

    /// Get cell at position (x, y)
    /// Returns None if out of bounds
    pub fn get(&self, x: i8, y: i8) -> Option<Cell> {
        Self::index(x, y).map(|idx| self.cells[idx])
    }

    /// Set cell at position (x, y) without notifying listeners
    /// Returns false if out of bounds
    pub fn set(&mut self, x: i8, y: i8, cell: Cell) -> bool {
        match Self::index(x, y) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    /// Whether `piece` placed at `pos` hits a wall, the floor, or a settled block
    pub fn collide(&self, piece: &Piece, pos: Position) -> bool {
        piece.blocks().any(|(dx, dy, _)| {
            match self.get(pos.x + dx, pos.y + dy) {
                Some(cell) => cell != 0,
                None => true,
            }
        })
    }

    /// Write every block of `piece` at `pos` into the grid
    pub fn merge(&mut self, piece: &Piece, pos: Position) {
        for (dx, dy, color) in piece.blocks() {
            self.set(pos.x + dx, pos.y + dy, color);
        }
        self.notify();
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, y: usize) -> bool {
        if y >= ARENA_HEIGHT as usize {
            return false;
        }
        let start = y * ARENA_WIDTH as usize;
        let end = start + ARENA_WIDTH as usize;
        self.cells[start..end].iter().all(|&cell| cell != 0)
    }

    /// Remove all full rows, shifting the rest down and refilling the top.
    ///
    /// Two-pointer compaction from the bottom, so a row that slides into a
    /// removed slot is examined as well.
    pub fn sweep(&mut self) -> SweepResult {
        let mut result = SweepResult::default();
        let width = ARENA_WIDTH as usize;
        let mut write_y = ARENA_HEIGHT as usize;

        for read_y in (0..ARENA_HEIGHT as usize).rev() {
            if self.is_row_full(read_y) {
                result.cleared_rows.push(read_y);
            } else {
                write_y -= 1;
                if write_y != read_y {
                    let src_start = read_y * width;
                    let dst_start = write_y * width;
                    self.cells
                        .copy_within(src_start..src_start + width, dst_start);
                }
            }
        }

        for cell in &mut self.cells[..write_y * width] {
            *cell = 0;
        }

        result.rows_cleared = result.cleared_rows.len();
        result.score = sweep_score(result.rows_cleared);
        if result.rows_cleared > 0 {
            self.notify();
        }
        result
    }

    /// Clear the entire arena
    pub fn clear(&mut self) {
        self.cells = [0; ARENA_SIZE];
        self.notify();
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Grid as row vectors, as sent over the wire
    pub fn rows(&self) -> Vec<Vec<Cell>> {
        self.cells
            .chunks(ARENA_WIDTH as usize)
            .map(|row| row.to_vec())
            .collect()
    }

    pub fn events_mut(&mut self) -> &mut EventBus<ArenaEvent> {
        &mut self.events
    }

    fn notify(&mut self) {
        let event = ArenaEvent::Matrix(self.rows());
        self.events.emit(&event);
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("rows", &self.rows())
            .field("events", &self.events)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_index_calculation() {
        assert_eq!(Arena::index(0, 0), Some(0));
        assert_eq!(Arena::index(11, 0), Some(11));
        assert_eq!(Arena::index(0, 1), Some(12));
        assert_eq!(Arena::index(11, 19), Some(239));
        assert_eq!(Arena::index(-1, 0), None);
        assert_eq!(Arena::index(12, 0), None);
        assert_eq!(Arena::index(0, 20), None);
    }

    #[test]
    fn test_sweep_score_law() {
        assert_eq!(sweep_score(0), 0);
        assert_eq!(sweep_score(1), 10);
        assert_eq!(sweep_score(2), 30);
        assert_eq!(sweep_score(3), 70);
        assert_eq!(sweep_score(4), 150);
    }

    #[test]
    fn test_sweep_removes_non_adjacent_rows() {
        let mut arena = Arena::new();
        for x in 0..ARENA_WIDTH as i8 {
            arena.set(x, 19, 1);
            arena.set(x, 17, 2);
        }
        arena.set(0, 18, 3);
        arena.set(5, 16, 4);

        let result = arena.sweep();
        assert_eq!(result.rows_cleared, 2);
        assert_eq!(result.score, 30);
        assert_eq!(result.cleared_rows.as_slice(), &[19, 17]);
        assert_eq!(arena.get(0, 19), Some(3));
        assert_eq!(arena.get(5, 18), Some(4));
        assert_eq!(arena.get(5, 17), Some(0));
    }

    #[test]
    fn test_rows_roundtrip() {
        let mut arena = Arena::new();
        arena.set(3, 5, 6);
        arena.set(11, 19, 2);

        let copy = Arena::from_rows(&arena.rows());
        assert_eq!(copy.cells(), arena.cells());
    }
}
