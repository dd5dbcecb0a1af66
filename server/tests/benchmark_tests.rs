//! Coarse performance checks for the hot paths of the server

use rand::rngs::StdRng;
use rand::SeedableRng;
use server::config::SessionConfig;
use server::registry::{PeerId, PeerRegistry};
use server::scheduler::TurnScheduler;
use server::session::{GameSession, Phase, SessionAction, SessionEvent};
use shared::{Frame, Packet};
use std::time::Instant;

/// Benchmarks packet encode and decode
#[test]
fn benchmark_packet_codec() {
    let packets = [
        Packet::Handshake {
            display_name: "A fairly long display name for a player".to_string(),
        },
        Packet::Guess { value: 42 },
        Packet::TurnPrompt { upper_bound: 100 },
        Packet::Broadcast {
            text: "Round 12 has started! Guess a number between 1 and 100.".to_string(),
        },
    ];

    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let packet = &packets[i % packets.len()];
        let bytes = packet.encode();
        let decoded = Packet::decode(&bytes).unwrap();
        assert_eq!(decoded.discriminant(), packet.discriminant());
    }

    let duration = start.elapsed();
    println!(
        "Packet codec: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}

/// Benchmarks wrapping packets into transport frames
#[test]
fn benchmark_frame_serialization() {
    let packet = Packet::Broadcast {
        text: "Somebody guessed 57: incorrect (too high).".to_string(),
    };

    let iterations = 50_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let bytes = Frame::payload(&packet).to_bytes().unwrap();
        let _frame = Frame::from_bytes(&bytes).unwrap();
    }

    let duration = start.elapsed();
    println!("Frame serialization: {} iterations in {:?}", iterations, duration);

    assert!(duration.as_millis() < 2000);
}

/// Benchmarks turn rotation over a full server
#[test]
fn benchmark_turn_rotation() {
    let mut registry = PeerRegistry::new();
    for id in 1..=shared::MAX_PEERS as u32 {
        registry.register(PeerId(id), format!("Player {}", id));
    }

    let mut scheduler = TurnScheduler::new();
    scheduler.set_active(TurnScheduler::next_after(&registry, None));

    let iterations = 200_000;
    let start = Instant::now();

    for _ in 0..iterations {
        scheduler.advance(&registry);
    }

    let duration = start.elapsed();
    println!("Turn rotation: {} advances in {:?}", iterations, duration);

    // 200_000 is a multiple of 32, so the rotation lands back on the first peer.
    assert_eq!(scheduler.active(), Some(PeerId(1)));
    assert!(duration.as_millis() < 1000);
}

/// Stress tests whole rounds through the session state machine
#[test]
fn stress_test_many_rounds() {
    let config = SessionConfig::default();
    let mut session = GameSession::with_rng(config.clone(), StdRng::seed_from_u64(7));

    for id in 1..=4 {
        session.handle(SessionEvent::Connected(PeerId(id)));
        let handshake = Packet::Handshake {
            display_name: format!("Player {}", id),
        };
        session.handle(SessionEvent::Received {
            peer: PeerId(id),
            data: handshake.encode(),
        });
    }

    let rounds = 500;
    let start = Instant::now();

    for round in 1..=rounds {
        assert_eq!(session.phase(), Phase::InProgress);
        assert_eq!(session.round(), round);

        for value in 1..=config.upper_bound {
            let Some(peer) = session.active_peer() else {
                break;
            };
            session.handle(SessionEvent::Received {
                peer,
                data: Packet::Guess { value }.encode(),
            });
            if session.phase() == Phase::Ending {
                break;
            }
        }

        assert_eq!(session.phase(), Phase::Ending);
        let actions = session.handle(SessionEvent::CooldownElapsed);
        assert!(!actions.is_empty());
        assert!(!actions
            .iter()
            .any(|action| matches!(action, SessionAction::ScheduleCooldown(_))));
    }

    let duration = start.elapsed();
    println!("Played {} rounds in {:?}", rounds, duration);

    assert!(duration.as_millis() < 5000);
}
