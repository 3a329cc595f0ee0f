//! Pieces tests - canonical shapes, in-place rotation and generation

use epic_tetris::core::{Piece, PieceGenerator};
use epic_tetris::types::PieceKind;

// ============== Shape Tests ==============

#[test]
fn test_canonical_sizes() {
    for kind in PieceKind::ALL {
        let piece = Piece::canonical(kind);
        let expected = match kind {
            PieceKind::O => 2,
            PieceKind::I => 4,
            _ => 3,
        };
        assert_eq!(piece.size(), expected, "{:?}", kind);
        assert_eq!(piece.block_count(), 4, "{:?}", kind);
    }
}

#[test]
fn test_canonical_colors_match_kind() {
    for kind in PieceKind::ALL {
        let piece = Piece::canonical(kind);
        assert!(
            piece.blocks().all(|(_, _, c)| c == kind.color()),
            "{:?} uses a foreign color",
            kind
        );
    }
}

#[test]
fn test_t_piece_rows() {
    let t = Piece::canonical(PieceKind::T);
    assert_eq!(t.rows(), vec![vec![0, 0, 0], vec![7, 7, 7], vec![0, 7, 0]]);
}

// ============== Rotation Tests ==============

#[test]
fn test_t_rotate_clockwise() {
    let mut t = Piece::canonical(PieceKind::T);
    t.rotate(1);
    assert_eq!(t.rows(), vec![vec![0, 7, 0], vec![7, 7, 0], vec![0, 7, 0]]);
}

#[test]
fn test_t_rotate_counter_clockwise() {
    let mut t = Piece::canonical(PieceKind::T);
    t.rotate(-1);
    assert_eq!(t.rows(), vec![vec![0, 7, 0], vec![0, 7, 7], vec![0, 7, 0]]);
}

#[test]
fn test_i_rotates_to_horizontal() {
    let mut i = Piece::canonical(PieceKind::I);
    i.rotate(1);
    assert_eq!(i.rows()[1], vec![3, 3, 3, 3]);
    assert_eq!(i.block_count(), 4);
}

#[test]
fn test_four_rotations_are_identity() {
    for kind in PieceKind::ALL {
        let original = Piece::canonical(kind);
        for dir in [1, -1] {
            let mut piece = original;
            for _ in 0..4 {
                piece.rotate(dir);
            }
            assert_eq!(piece, original, "{:?} dir {}", kind, dir);
        }
    }
}

#[test]
fn test_rotate_then_reverse_restores() {
    for kind in PieceKind::ALL {
        let original = Piece::canonical(kind);
        let mut piece = original;
        piece.rotate(1);
        piece.rotate(-1);
        assert_eq!(piece, original, "{:?}", kind);
    }
}

#[test]
fn test_o_rotation_invariant() {
    let o = Piece::canonical(PieceKind::O);
    let mut rotated = o;
    rotated.rotate(1);
    assert_eq!(rotated, o);
}

// ============== Wire Rows ==============

#[test]
fn test_from_rows_accepts_squares_only() {
    assert!(Piece::from_rows(&[vec![1u8, 0], vec![0, 1]]).is_some());
    assert!(Piece::from_rows(&[vec![1u8, 0, 0], vec![0, 1, 0]]).is_none());
    assert!(Piece::from_rows::<Vec<u8>>(&[]).is_none());
    assert!(Piece::from_rows(&vec![vec![0u8; 5]; 5]).is_none());
}

#[test]
fn test_rows_round_trip_keeps_equality() {
    let mut piece = Piece::canonical(PieceKind::L);
    piece.rotate(1);
    assert_eq!(Piece::from_rows(&piece.rows()), Some(piece));
}

// ============== Generator Tests ==============

#[test]
fn test_generator_deterministic() {
    let mut a = PieceGenerator::new(42);
    let mut b = PieceGenerator::new(42);
    for _ in 0..50 {
        assert_eq!(a.next(false), b.next(false));
    }
}

#[test]
fn test_generator_produces_every_kind() {
    let mut generator = PieceGenerator::new(7);
    let canon: Vec<Piece> = PieceKind::ALL.iter().map(|&k| Piece::canonical(k)).collect();
    let mut seen = [false; 7];
    for _ in 0..500 {
        let piece = generator.next(false);
        let idx = canon.iter().position(|c| *c == piece).expect("not a canonical piece");
        seen[idx] = true;
    }
    assert!(seen.iter().all(|&s| s), "missing kinds: {:?}", seen);
}

#[test]
fn test_random_layouts_are_3x3_and_non_empty() {
    let mut generator = PieceGenerator::new(99);
    for _ in 0..200 {
        let piece = generator.next(true);
        assert_eq!(piece.size(), 3);
        assert!(!piece.is_empty());
        assert!(piece.blocks().all(|(_, _, c)| (1..=7).contains(&c)));
    }
}
