//! Authoritative game session state machine
//!
//! The session consumes transport events one at a time and answers with a
//! list of [`SessionAction`]s for the network layer to carry out. It performs
//! no I/O itself, which keeps every transition testable without sockets.
//!
//! ```text
//!                 quorum met
//! WaitingForPlayers ────────► InProgress
//!        ▲                      │  winning guess, or
//!        │ quorum missed        │  last player left
//!        │                      ▼
//!        └──────────────────  Ending ── cooldown ──► quorum check
//! ```
//!
//! Players who join mid-round are appended to the rotation and get a turn
//! in the current round once the rotation reaches them.

use crate::config::SessionConfig;
use crate::registry::{PeerId, PeerRegistry};
use crate::scheduler::TurnScheduler;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{Packet, MAX_NAME_LEN};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    WaitingForPlayers,
    InProgress,
    Ending,
}

/// Inputs fed to the session by the event loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Connected(PeerId),
    Received { peer: PeerId, data: Vec<u8> },
    Disconnected(PeerId),
    /// The cooldown requested by [`SessionAction::ScheduleCooldown`] has passed
    CooldownElapsed,
}

/// Work the event loop performs on behalf of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    Send { peer: PeerId, packet: Packet },
    Broadcast { packet: Packet },
    ScheduleCooldown(Duration),
}

/// Collects actions in emission order
#[derive(Default)]
struct Outbox(Vec<SessionAction>);

impl Outbox {
    fn send(&mut self, peer: PeerId, packet: Packet) {
        self.0.push(SessionAction::Send { peer, packet });
    }

    fn broadcast(&mut self, text: String) {
        self.0.push(SessionAction::Broadcast {
            packet: Packet::Broadcast { text },
        });
    }

    fn schedule_cooldown(&mut self, delay: Duration) {
        self.0.push(SessionAction::ScheduleCooldown(delay));
    }
}

pub struct GameSession {
    config: SessionConfig,
    phase: Phase,
    secret: Option<i32>,
    round: u32,
    registry: PeerRegistry,
    scheduler: TurnScheduler,
    rng: StdRng,
}

impl GameSession {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Creates a session drawing secrets from the given generator.
    ///
    /// The guess range is raised to at least `[1, 1]`.
    pub fn with_rng(mut config: SessionConfig, rng: StdRng) -> Self {
        if config.upper_bound < 1 {
            warn!("Upper bound {} is below 1, using 1", config.upper_bound);
            config.upper_bound = 1;
        }

        Self {
            config,
            phase: Phase::WaitingForPlayers,
            secret: None,
            round: 0,
            registry: PeerRegistry::new(),
            scheduler: TurnScheduler::new(),
            rng,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn secret(&self) -> Option<i32> {
        self.secret
    }

    pub fn active_peer(&self) -> Option<PeerId> {
        self.scheduler.active()
    }

    /// Number of rounds started so far
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn player_count(&self) -> usize {
        self.registry.count()
    }

    pub fn registry(&self) -> &PeerRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Processes one event to completion
    pub fn handle(&mut self, event: SessionEvent) -> Vec<SessionAction> {
        let mut out = Outbox::default();

        match event {
            SessionEvent::Connected(peer) => {
                debug!("{} connected, waiting for handshake", peer);
            }
            SessionEvent::Received { peer, data } => match Packet::decode(&data) {
                Ok(packet) => self.on_packet(peer, packet, &mut out),
                Err(e) => warn!("Dropping packet from {}: {}", peer, e),
            },
            SessionEvent::Disconnected(peer) => self.on_disconnect(peer, &mut out),
            SessionEvent::CooldownElapsed => self.on_cooldown_elapsed(&mut out),
        }

        out.0
    }

    fn on_packet(&mut self, peer: PeerId, packet: Packet, out: &mut Outbox) {
        match packet {
            Packet::Handshake { display_name } => self.on_handshake(peer, &display_name, out),
            Packet::Guess { value } => self.on_guess(peer, value, out),
            Packet::TurnPrompt { .. } | Packet::Broadcast { .. } => {
                warn!("Dropping server-only {} packet from {}", packet.kind(), peer);
            }
        }
    }

    fn on_handshake(&mut self, peer: PeerId, display_name: &str, out: &mut Outbox) {
        if self.registry.contains(peer) {
            debug!("Ignoring repeated handshake from {}", peer);
            return;
        }

        let name = match display_name.trim() {
            "" => format!("Player {}", peer.0),
            trimmed => trimmed.chars().take(MAX_NAME_LEN).collect(),
        };

        self.registry.register(peer, name.clone());
        info!(
            "{} joined as {:?} ({} players)",
            peer,
            name,
            self.registry.count()
        );
        out.broadcast(format!("{name} has joined the game."));

        // Mid-round and cooldown joins wait for the rotation or the next
        // quorum check.
        if self.phase == Phase::WaitingForPlayers {
            self.evaluate_quorum(out);
        }
    }

    fn on_guess(&mut self, peer: PeerId, value: i32, out: &mut Outbox) {
        if self.phase != Phase::InProgress || !self.scheduler.is_active(peer) {
            debug!("Ignoring out-of-turn guess {} from {}", value, peer);
            return;
        }
        let Some(secret) = self.secret else {
            return;
        };

        let upper_bound = self.config.upper_bound;
        if !(1..=upper_bound).contains(&value) {
            debug!("Guess {} from {} is out of range, prompting again", value, peer);
            out.send(peer, Packet::TurnPrompt { upper_bound });
            return;
        }

        let name = self.name_of(peer);

        if value == secret {
            info!("Round {} won by {} with {}", self.round, name, value);
            out.broadcast(format!("{name} wins with a guess of {value}!"));
            self.end_round(out);
        } else {
            let hint = if value < secret { "too low" } else { "too high" };
            out.broadcast(format!("{name} guessed {value}: incorrect ({hint})."));
            self.scheduler.advance(&self.registry);
            self.prompt_active(out);
        }
    }

    fn on_disconnect(&mut self, peer: PeerId, out: &mut Outbox) {
        // The successor has to be taken from the order before removal.
        let was_active = self.phase == Phase::InProgress && self.scheduler.is_active(peer);
        let successor = if was_active {
            TurnScheduler::next_after(&self.registry, Some(peer)).filter(|next| *next != peer)
        } else {
            None
        };

        let Some(player) = self.registry.unregister(peer) else {
            debug!("{} disconnected before its handshake", peer);
            return;
        };

        info!(
            "{} ({:?}) left ({} players)",
            peer,
            player.name,
            self.registry.count()
        );
        out.broadcast(format!("{} has left the game.", player.name));

        if self.phase != Phase::InProgress {
            return;
        }

        if self.registry.is_empty() {
            info!("All players left, ending round {}", self.round);
            self.end_round(out);
        } else if was_active {
            self.scheduler.set_active(successor);
            self.prompt_active(out);
        }
    }

    fn on_cooldown_elapsed(&mut self, out: &mut Outbox) {
        if self.phase != Phase::Ending {
            debug!("Ignoring cooldown outside of Ending");
            return;
        }
        self.evaluate_quorum(out);
    }

    fn evaluate_quorum(&mut self, out: &mut Outbox) {
        let count = self.registry.count();
        let min = self.config.min_players;

        if count >= min {
            self.start_round(out);
        } else {
            self.phase = Phase::WaitingForPlayers;
            out.broadcast(format!("Waiting for players ({count}/{min})."));
        }
    }

    fn start_round(&mut self, out: &mut Outbox) {
        let upper_bound = self.config.upper_bound;

        self.phase = Phase::InProgress;
        self.round += 1;
        self.secret = Some(self.rng.gen_range(1..=upper_bound));
        self.scheduler
            .set_active(TurnScheduler::next_after(&self.registry, None));

        info!(
            "Round {} started with {} players",
            self.round,
            self.registry.count()
        );
        out.broadcast(format!(
            "Round {} has started! Guess a number between 1 and {}.",
            self.round, upper_bound
        ));
        self.prompt_active(out);
    }

    fn prompt_active(&mut self, out: &mut Outbox) {
        let Some(peer) = self.scheduler.active() else {
            return;
        };

        out.broadcast(format!("It is {}'s turn.", self.name_of(peer)));
        out.send(
            peer,
            Packet::TurnPrompt {
                upper_bound: self.config.upper_bound,
            },
        );
    }

    fn end_round(&mut self, out: &mut Outbox) {
        self.phase = Phase::Ending;
        self.secret = None;
        self.scheduler.clear();

        if !self.registry.is_empty() {
            out.broadcast(format!(
                "Round over. The next round starts in {:?}.",
                self.config.cooldown
            ));
        }
        out.schedule_cooldown(self.config.cooldown);
    }

    fn name_of(&self, peer: PeerId) -> String {
        self.registry
            .name_of(peer)
            .map_or_else(|| peer.to_string(), str::to_string)
    }
}
