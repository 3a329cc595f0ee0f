//! RNG module - piece generation
//!
//! Pieces are drawn uniformly from the seven canonical shapes. While the
//! RANDOM-PIECES debuff is active the generator produces 3x3 layouts where
//! every cell is independently empty (about half the time) or one of the
//! seven colors, re-rolled until at least one cell is occupied.
//!
//! A seeded LCG keeps every sequence reproducible in tests.

use crate::pieces::Piece;
use crate::types::{Cell, PieceKind, COLOR_COUNT};

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        // Low bits of a power-of-two LCG have tiny periods.
        (self.next_u32() >> 8) % max
    }

    /// True with probability `1 / denominator`
    pub fn one_in(&mut self, denominator: u32) -> bool {
        self.next_range(denominator) == 0
    }

    /// Uniformly pick one element
    pub fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        items[self.next_range(items.len() as u32) as usize]
    }
}

/// Side length of RANDOM-PIECES layouts
pub const RANDOM_PIECE_SIZE: usize = 3;

/// Produces the next piece for a player
#[derive(Debug, Clone)]
pub struct PieceGenerator {
    rng: SimpleRng,
}

impl PieceGenerator {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: SimpleRng::new(seed),
        }
    }

    /// Next piece: canonical, or a random block layout when `random_blocks`
    pub fn next(&mut self, random_blocks: bool) -> Piece {
        if random_blocks {
            self.random_layout()
        } else {
            Piece::canonical(self.rng.pick(&PieceKind::ALL))
        }
    }

    fn random_layout(&mut self) -> Piece {
        loop {
            let mut grid = [[0 as Cell; RANDOM_PIECE_SIZE]; RANDOM_PIECE_SIZE];
            for row in grid.iter_mut() {
                for cell in row.iter_mut() {
                    if !self.rng.one_in(2) {
                        *cell = 1 + self.rng.next_range(COLOR_COUNT as u32) as Cell;
                    }
                }
            }
            let piece = Piece::from_grid(grid);
            if !piece.is_empty() {
                return piece;
            }
        }
    }

    /// Shared RNG, also used for debuff selection
    pub fn rng_mut(&mut self) -> &mut SimpleRng {
        &mut self.rng
    }
}

impl Default for PieceGenerator {
    fn default() -> Self {
        Self::new(1)
    }
}
