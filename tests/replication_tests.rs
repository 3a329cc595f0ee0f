//! Replication tests - two local games kept in sync through an in-process broker

use tokio::sync::mpsc::{self, UnboundedReceiver};

use epic_tetris::adapter::{Broker, ClientId, Message, SessionStore};
use epic_tetris::core::{Piece, Tetris};
use epic_tetris::replication::{ClientNotice, ReplicationClient};
use epic_tetris::types::{PieceKind, Position, ARENA_WIDTH, START_COUNTDOWN_MS};

struct Participant {
    broker_id: ClientId,
    to_broker: UnboundedReceiver<Message>,
    from_broker: UnboundedReceiver<Message>,
    client: ReplicationClient,
    tetris: Tetris,
    notices: Vec<ClientNotice>,
}

fn participant(broker: &mut Broker, seed: u32, name: &str) -> Participant {
    let (out_tx, to_broker) = mpsc::unbounded_channel();
    let (in_tx, from_broker) = mpsc::unbounded_channel();
    let broker_id = broker.connect(in_tx);

    let client = ReplicationClient::new(out_tx);
    let mut tetris = Tetris::new(seed);
    tetris.player_mut().set_name(name);
    client.watch(tetris.player_mut());

    Participant {
        broker_id,
        to_broker,
        from_broker,
        client,
        tetris,
        notices: Vec::new(),
    }
}

/// Move messages both ways until nothing is in flight
fn pump(broker: &mut Broker, players: &mut [Participant]) {
    loop {
        let mut moved = false;
        for p in players.iter_mut() {
            while let Ok(msg) = p.to_broker.try_recv() {
                moved = true;
                let _ = broker.handle(&p.broker_id, msg);
            }
        }
        for p in players.iter_mut() {
            while let Ok(msg) = p.from_broker.try_recv() {
                moved = true;
                if let Some(notice) = p.client.receive(msg, &mut p.tetris) {
                    p.notices.push(notice);
                }
            }
        }
        if !moved {
            break;
        }
    }
}

/// Alice and Bob, both in session "room01"
fn two_players() -> (Broker, Vec<Participant>) {
    let mut broker = Broker::seeded(SessionStore::new(), 21);
    let mut players = vec![
        participant(&mut broker, 1, "alice"),
        participant(&mut broker, 2, "bob"),
    ];
    for i in 0..players.len() {
        let p = &mut players[i];
        p.client.init_session(&p.tetris, Some("room01"));
        pump(&mut broker, &mut players);
    }
    for p in players.iter_mut() {
        p.notices.clear();
    }
    (broker, players)
}

fn fill_rows_except(tetris: &mut Tetris, ys: std::ops::Range<i8>, gap: i8) {
    for y in ys {
        for x in 0..ARENA_WIDTH as i8 {
            if x != gap {
                tetris.player_mut().arena_mut().set(x, y, 1);
            }
        }
    }
}

#[test]
fn test_roster_builds_mirrors() {
    let (_broker, players) = two_players();
    let (alice, bob) = (&players[0], &players[1]);

    assert_eq!(alice.client.local_id(), Some(alice.broker_id.as_str()));
    assert_eq!(bob.client.local_id(), Some(bob.broker_id.as_str()));
    assert_eq!(alice.client.session_id(), Some("room01"));
    assert_eq!(bob.client.session_id(), Some("room01"));

    let bob_seen_by_alice = alice.client.peer(&bob.broker_id).unwrap();
    assert_eq!(bob_seen_by_alice.name(), "bob");
    assert_eq!(bob_seen_by_alice.pos(), bob.tetris.player().pos());
    assert_eq!(alice.client.peers().count(), 1);
    assert!(bob.client.peer(&bob.broker_id).is_none());
}

#[test]
fn test_lock_replicates_arena_and_piece() {
    let (mut broker, mut players) = two_players();

    players[0].tetris.player_mut().hard_drop();
    pump(&mut broker, &mut players);

    let (alice, bob) = (&players[0], &players[1]);
    let mirror = bob.client.peer(&alice.broker_id).unwrap();
    assert_eq!(mirror.arena().cells(), alice.tetris.player().arena().cells());
    assert!(mirror.arena().cells().iter().any(|&c| c != 0));
    assert_eq!(mirror.pos(), alice.tetris.player().pos());
    assert_eq!(mirror.piece(), Some(alice.tetris.player().piece()));
    assert!(mirror.redraws() > 0);
}

#[test]
fn test_row_clear_debuffs_opponent_and_raises_speed() {
    let (mut broker, mut players) = two_players();
    {
        let alice = &mut players[0].tetris;
        fill_rows_except(alice, 16..20, 5);
        alice
            .player_mut()
            .set_piece(Piece::canonical(PieceKind::I), Position::new(4, 0));
        alice.player_mut().hard_drop();
    }
    pump(&mut broker, &mut players);

    let (alice, bob) = (&players[0], &players[1]);
    assert_eq!(alice.tetris.player().score(), 150);
    assert_eq!(bob.client.peer(&alice.broker_id).unwrap().score(), 150);
    assert_eq!(bob.tetris.player().opponent_score_sum(), 150);

    let received: Vec<_> = bob
        .notices
        .iter()
        .filter_map(|n| match n {
            ClientNotice::DebuffReceived { kind, duration_ms } => Some((*kind, *duration_ms)),
            _ => None,
        })
        .collect();
    assert_eq!(received.len(), 1);
    let (kind, duration_ms) = received[0];
    assert_eq!(duration_ms, 20000);
    assert!(bob.tetris.player().has_debuff(kind));

    assert!(alice.notices.contains(&ClientNotice::DebuffLanded {
        target: bob.broker_id.clone(),
        kind,
    }));
    assert_eq!(
        alice.client.peer(&bob.broker_id).unwrap().last_debuff(),
        Some(kind)
    );
}

#[test]
fn test_start_request_starts_everyone() {
    let (mut broker, mut players) = two_players();

    players[1].tetris.player_mut().request_start();
    pump(&mut broker, &mut players);

    for p in players.iter_mut() {
        assert!(p.notices.contains(&ClientNotice::GameStarted));
        assert_eq!(p.tetris.countdown_ms(), Some(START_COUNTDOWN_MS));
        p.tetris.frame(START_COUNTDOWN_MS);
        assert!(p.tetris.is_started());
    }
}

#[test]
fn test_last_player_standing_wins() {
    let (mut broker, mut players) = two_players();
    {
        let bob = &mut players[1].tetris;
        bob.player_mut()
            .set_piece(Piece::canonical(PieceKind::O), Position::new(5, 0));
        fill_rows_except(bob, 2..20, 0);
        bob.player_mut().hard_drop();
        assert!(bob.player().is_game_over());
    }
    pump(&mut broker, &mut players);

    let alice = &players[0];
    let bob_id = &players[1].broker_id;
    assert!(alice.client.peer(bob_id).unwrap().is_game_over());

    let winner = alice
        .notices
        .iter()
        .find_map(|n| match n {
            ClientNotice::Winner(w) => Some(w.clone()),
            _ => None,
        })
        .expect("no winner announced");
    assert!(winner.is_local);
    assert_eq!(winner.id, alice.broker_id);
    assert_eq!(winner.name, "alice");

    assert_eq!(
        players[1].client.winner(players[1].tetris.player()).map(|w| w.is_local),
        Some(false)
    );
}

#[test]
fn test_local_loss_announces_remaining_winner() {
    let (mut broker, mut players) = two_players();
    {
        let alice = &mut players[0].tetris;
        alice
            .player_mut()
            .set_piece(Piece::canonical(PieceKind::O), Position::new(5, 0));
        fill_rows_except(alice, 2..20, 0);
        alice.player_mut().hard_drop();
        assert!(alice.player().is_game_over());
    }

    let alice = &players[0];
    let Some(ClientNotice::Winner(winner)) = alice.client.after_frame(&alice.tetris) else {
        panic!("local loss did not decide the game");
    };
    assert!(!winner.is_local);
    assert_eq!(winner.id, players[1].broker_id);
    assert_eq!(winner.name, "bob");
    assert!(alice.client.after_frame(&alice.tetris).is_none());

    pump(&mut broker, &mut players);
    let bob = &players[1];
    assert!(bob.notices.iter().any(|n| matches!(
        n,
        ClientNotice::Winner(w) if w.is_local && w.id == bob.broker_id
    )));
}

#[test]
fn test_restart_sends_everyone_to_same_session() {
    let (mut broker, mut players) = two_players();

    players[0].tetris.player_mut().request_restart();
    pump(&mut broker, &mut players);

    let targets: Vec<_> = players
        .iter()
        .map(|p| {
            assert!(p.notices.contains(&ClientNotice::RestartRequested));
            p.notices
                .iter()
                .find_map(|n| match n {
                    ClientNotice::GoToSession(id) => Some(id.clone()),
                    _ => None,
                })
                .expect("no go-to-session")
        })
        .collect();
    assert_eq!(targets[0], targets[1]);
    assert_ne!(targets[0], "room01");
}

#[test]
fn test_departure_removes_mirror() {
    let (mut broker, mut players) = two_players();
    let bob_id = players[1].broker_id.clone();

    broker.disconnect(&bob_id).unwrap();
    pump(&mut broker, &mut players);

    let alice = &players[0];
    assert!(alice.client.peer(&bob_id).is_none());
    assert!(alice.notices.contains(&ClientNotice::RosterChanged {
        joined: vec![],
        left: vec![bob_id],
    }));
}

#[test]
fn test_update_for_unknown_peer_is_ignored() {
    let (_broker, mut players) = two_players();
    let alice = &mut players[0];
    let before = alice.tetris.player().opponent_score_sum();

    let msg = Message::StateUpdate {
        fragment: epic_tetris::types::Fragment::Player,
        entry: epic_tetris::adapter::Entry::Score(999),
        client_id: Some("ghost1".into()),
    };
    assert!(alice.client.receive(msg, &mut alice.tetris).is_none());
    assert_eq!(alice.tetris.player().opponent_score_sum(), before);
}
