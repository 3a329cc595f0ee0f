//! Pieces module - block patterns under player control
//!
//! A piece is a small square matrix of cells (2x2, 3x3 or 4x4) where every
//! non-zero cell is a block. Rotation happens in place: transpose, then
//! reverse each row (clockwise) or the row order (counter-clockwise).
//! There are no kick tables here; kicks are searched by the player.

use crate::types::{Cell, PieceKind};

/// Largest supported piece side
pub const MAX_PIECE_SIZE: usize = 4;

const PIECE_CELLS: usize = MAX_PIECE_SIZE * MAX_PIECE_SIZE;

/// A square block pattern, stored row-major in a fixed array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    size: u8,
    cells: [Cell; PIECE_CELLS],
}

impl Piece {
    /// Build one of the seven canonical shapes
    pub fn canonical(kind: PieceKind) -> Self {
        match kind {
            PieceKind::T => Self::from_grid([[0, 0, 0], [7, 7, 7], [0, 7, 0]]),
            PieceKind::O => Self::from_grid([[6, 6], [6, 6]]),
            PieceKind::L => Self::from_grid([[0, 5, 0], [0, 5, 0], [0, 5, 5]]),
            PieceKind::J => Self::from_grid([[0, 4, 0], [0, 4, 0], [4, 4, 0]]),
            PieceKind::I => Self::from_grid([
                [0, 3, 0, 0],
                [0, 3, 0, 0],
                [0, 3, 0, 0],
                [0, 3, 0, 0],
            ]),
            PieceKind::S => Self::from_grid([[0, 2, 2], [2, 2, 0], [0, 0, 0]]),
            PieceKind::Z => Self::from_grid([[1, 1, 0], [0, 1, 1], [0, 0, 0]]),
        }
    }

    /// Build a piece from a fixed-size square grid
    pub fn from_grid<const N: usize>(grid: [[Cell; N]; N]) -> Self {
        assert!(N > 0 && N <= MAX_PIECE_SIZE, "piece side must be 1..=4");
        let mut piece = Self {
            size: N as u8,
            cells: [0; PIECE_CELLS],
        };
        for (y, row) in grid.iter().enumerate() {
            for (x, &cell) in row.iter().enumerate() {
                piece.cells[y * MAX_PIECE_SIZE + x] = cell;
            }
        }
        piece
    }

    /// Build a piece from row vectors (e.g. received over the wire).
    ///
    /// Returns None unless the rows form a square of side 1..=4.
    pub fn from_rows<R: AsRef<[Cell]>>(rows: &[R]) -> Option<Self> {
        let n = rows.len();
        if n == 0 || n > MAX_PIECE_SIZE || rows.iter().any(|r| r.as_ref().len() != n) {
            return None;
        }
        let mut piece = Self {
            size: n as u8,
            cells: [0; PIECE_CELLS],
        };
        for (y, row) in rows.iter().enumerate() {
            for (x, &cell) in row.as_ref().iter().enumerate() {
                piece.cells[y * MAX_PIECE_SIZE + x] = cell;
            }
        }
        Some(piece)
    }

    /// Side length (width == height)
    pub fn size(&self) -> u8 {
        self.size
    }

    /// Cell at (x, y) in piece-local coordinates, 0 outside the piece
    pub fn get(&self, x: usize, y: usize) -> Cell {
        let n = self.size as usize;
        if x >= n || y >= n {
            return 0;
        }
        self.cells[y * MAX_PIECE_SIZE + x]
    }

    /// Non-zero cells as (x, y, color) in piece-local coordinates
    pub fn blocks(&self) -> impl Iterator<Item = (i8, i8, Cell)> + '_ {
        let n = self.size as usize;
        (0..n).flat_map(move |y| {
            (0..n).filter_map(move |x| {
                let cell = self.cells[y * MAX_PIECE_SIZE + x];
                (cell != 0).then_some((x as i8, y as i8, cell))
            })
        })
    }

    /// Number of occupied cells
    pub fn block_count(&self) -> usize {
        self.blocks().count()
    }

    pub fn is_empty(&self) -> bool {
        self.block_count() == 0
    }

    /// Rotate in place: `dir > 0` clockwise, otherwise counter-clockwise
    pub fn rotate(&mut self, dir: i8) {
        let n = self.size as usize;
        for y in 0..n {
            for x in 0..y {
                self.cells.swap(y * MAX_PIECE_SIZE + x, x * MAX_PIECE_SIZE + y);
            }
        }

        if dir > 0 {
            for y in 0..n {
                let start = y * MAX_PIECE_SIZE;
                self.cells[start..start + n].reverse();
            }
        } else {
            for y in 0..n / 2 {
                let (a, b) = (y * MAX_PIECE_SIZE, (n - 1 - y) * MAX_PIECE_SIZE);
                for x in 0..n {
                    self.cells.swap(a + x, b + x);
                }
            }
        }
    }

    /// Row vectors, as sent over the wire
    pub fn rows(&self) -> Vec<Vec<Cell>> {
        let n = self.size as usize;
        (0..n)
            .map(|y| {
                let start = y * MAX_PIECE_SIZE;
                self.cells[start..start + n].to_vec()
            })
            .collect()
    }
}

impl Default for Piece {
    fn default() -> Self {
        Self::canonical(PieceKind::T)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_colors_match_kind() {
        for kind in PieceKind::ALL {
            let piece = Piece::canonical(kind);
            assert_eq!(piece.block_count(), 4, "{:?} should have 4 blocks", kind);
            assert!(piece.blocks().all(|(_, _, c)| c == kind.color()));
        }
    }

    #[test]
    fn test_rotate_cw_then_ccw_restores() {
        for kind in PieceKind::ALL {
            let original = Piece::canonical(kind);
            let mut piece = original;
            piece.rotate(1);
            piece.rotate(-1);
            assert_eq!(piece, original);
        }
    }

    #[test]
    fn test_rotate_cw_moves_top_row_to_right_column() {
        let mut piece = Piece::from_grid([[1, 2, 3], [0, 0, 0], [0, 0, 0]]);
        piece.rotate(1);
        assert_eq!(piece.rows(), vec![vec![0, 0, 1], vec![0, 0, 2], vec![0, 0, 3]]);
    }

    #[test]
    fn test_rotate_ccw_moves_top_row_to_left_column() {
        let mut piece = Piece::from_grid([[1, 2, 3], [0, 0, 0], [0, 0, 0]]);
        piece.rotate(-1);
        assert_eq!(piece.rows(), vec![vec![3, 0, 0], vec![2, 0, 0], vec![1, 0, 0]]);
    }

    #[test]
    fn test_four_rotations_are_identity() {
        let original = Piece::canonical(PieceKind::L);
        let mut piece = original;
        for _ in 0..4 {
            piece.rotate(1);
        }
        assert_eq!(piece, original);
    }

    #[test]
    fn test_from_rows_rejects_non_square() {
        assert!(Piece::from_rows(&[vec![1, 1], vec![1]]).is_none());
        assert!(Piece::from_rows::<Vec<Cell>>(&[]).is_none());
        assert!(Piece::from_rows(&vec![vec![0; 5]; 5]).is_none());
        assert!(Piece::from_rows(&[vec![6, 6], vec![6, 6]]).is_some());
    }
}
