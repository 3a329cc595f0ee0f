use criterion::{black_box, criterion_group, criterion_main, Criterion};
use epic_tetris::adapter::{encode_message, parse_message, Entry, Message};
use epic_tetris::core::{Arena, Piece, Player, Tetris};
use epic_tetris::types::{PieceKind, Position};

fn bench_frame(c: &mut Criterion) {
    let mut game = Tetris::new(12345);
    game.start_with_countdown(0);

    c.bench_function("frame_16ms", |b| {
        b.iter(|| {
            if game.player().is_game_over() {
                game = Tetris::new(12345);
                game.start_with_countdown(0);
            }
            game.frame(black_box(16));
        })
    });
}

fn bench_sweep(c: &mut Criterion) {
    c.bench_function("sweep_4_rows", |b| {
        b.iter(|| {
            let mut arena = Arena::new();
            // Fill bottom 4 rows
            for y in 16..20 {
                for x in 0..12 {
                    arena.set(x, y, 3);
                }
            }
            arena.sweep()
        })
    });
}

fn bench_collide(c: &mut Criterion) {
    let mut arena = Arena::new();
    for x in 0..11 {
        arena.set(x, 19, 1);
    }
    let piece = Piece::canonical(PieceKind::T);

    c.bench_function("collide", |b| {
        b.iter(|| arena.collide(black_box(&piece), black_box(Position::new(4, 17))))
    });
}

fn bench_rotate(c: &mut Criterion) {
    let mut player = Player::new(12345);
    player.set_piece(Piece::canonical(PieceKind::I), Position::new(-1, 5));

    c.bench_function("rotate_with_kick", |b| {
        b.iter(|| {
            player.rotate(1);
        })
    });
}

fn bench_hard_drop(c: &mut Criterion) {
    c.bench_function("hard_drop", |b| {
        b.iter(|| {
            let mut player = Player::new(12345);
            player.hard_drop();
            player
        })
    });
}

fn bench_state_update_codec(c: &mut Criterion) {
    let msg = Message::arena_update(vec![vec![1; 12]; 20]);
    let text = encode_message(&msg).unwrap();

    c.bench_function("encode_arena_update", |b| {
        b.iter(|| encode_message(black_box(&msg)).unwrap())
    });
    c.bench_function("parse_arena_update", |b| {
        b.iter(|| parse_message(black_box(&text)).unwrap())
    });
    c.bench_function("parse_score_update", |b| {
        let score = encode_message(&Message::player_update(Entry::Score(150))).unwrap();
        b.iter(|| parse_message(black_box(&score)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_frame,
    bench_sweep,
    bench_collide,
    bench_rotate,
    bench_hard_drop,
    bench_state_update_codec
);
criterion_main!(benches);
