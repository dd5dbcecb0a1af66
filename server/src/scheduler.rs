//! Turn rotation over the peer registry
//!
//! One rule covers both advancing after a guess and reassigning the turn when
//! the active peer leaves: take the peer after `current` in registration
//! order, wrapping to the first peer.

use crate::registry::{PeerId, PeerRegistry};

#[derive(Debug, Default)]
pub struct TurnScheduler {
    active: Option<PeerId>,
}

impl TurnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Successor of `current` in registry order.
    ///
    /// - empty registry: `None`
    /// - `current` is `None`: the first peer
    /// - `current` is last or no longer registered: wraps to the first peer
    pub fn next_after(registry: &PeerRegistry, current: Option<PeerId>) -> Option<PeerId> {
        let first = registry.peer_at(0)?;

        current
            .and_then(|peer| registry.index_of(peer))
            .and_then(|index| registry.peer_at(index + 1))
            .or(Some(first))
    }

    pub fn active(&self) -> Option<PeerId> {
        self.active
    }

    pub fn is_active(&self, peer: PeerId) -> bool {
        self.active == Some(peer)
    }

    /// Moves the turn to the successor of the current active peer
    pub fn advance(&mut self, registry: &PeerRegistry) -> Option<PeerId> {
        self.active = Self::next_after(registry, self.active);
        self.active
    }

    pub fn set_active(&mut self, peer: Option<PeerId>) {
        self.active = peer;
    }

    pub fn clear(&mut self) {
        self.active = None;
    }
}
