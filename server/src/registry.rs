//! Registered players in join order
//!
//! The registry maps transport peer ids to display names. Insertion order is
//! the turn rotation order, so players are kept in a `Vec` rather than a hash
//! map. Player counts are bounded by the transport (32), which keeps linear
//! lookups cheap.

use std::fmt;

/// Opaque connection handle assigned by the transport layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub u32);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer {}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub peer: PeerId,
    pub name: String,
}

#[derive(Debug, Default)]
pub struct PeerRegistry {
    players: Vec<Player>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a player at the end of the rotation order.
    ///
    /// Returns false without touching the registry if the peer is already
    /// registered, so replayed handshakes are harmless.
    pub fn register(&mut self, peer: PeerId, name: impl Into<String>) -> bool {
        if self.contains(peer) {
            return false;
        }

        self.players.push(Player {
            peer,
            name: name.into(),
        });
        true
    }

    /// Removes a player, returning it if it was registered
    pub fn unregister(&mut self, peer: PeerId) -> Option<Player> {
        let index = self.index_of(peer)?;
        Some(self.players.remove(index))
    }

    pub fn name_of(&self, peer: PeerId) -> Option<&str> {
        self.players
            .iter()
            .find(|player| player.peer == peer)
            .map(|player| player.name.as_str())
    }

    pub fn contains(&self, peer: PeerId) -> bool {
        self.index_of(peer).is_some()
    }

    pub fn count(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Peer ids in registration order
    pub fn ordered_peers(&self) -> impl Iterator<Item = PeerId> + '_ {
        self.players.iter().map(|player| player.peer)
    }

    pub(crate) fn index_of(&self, peer: PeerId) -> Option<usize> {
        self.players.iter().position(|player| player.peer == peer)
    }

    pub(crate) fn peer_at(&self, index: usize) -> Option<PeerId> {
        self.players.get(index).map(|player| player.peer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_preserves_order() {
        let mut registry = PeerRegistry::new();
        assert!(registry.register(PeerId(7), "Ann"));
        assert!(registry.register(PeerId(2), "Bo"));
        assert!(registry.register(PeerId(5), "Cy"));

        let order: Vec<PeerId> = registry.ordered_peers().collect();
        assert_eq!(order, vec![PeerId(7), PeerId(2), PeerId(5)]);
        assert_eq!(registry.count(), 3);
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = PeerRegistry::new();
        assert!(registry.register(PeerId(1), "Ann"));
        assert!(!registry.register(PeerId(1), "Impostor"));

        assert_eq!(registry.count(), 1);
        assert_eq!(registry.name_of(PeerId(1)), Some("Ann"));
    }

    #[test]
    fn test_unregister() {
        let mut registry = PeerRegistry::new();
        registry.register(PeerId(1), "Ann");
        registry.register(PeerId(2), "Bo");

        let removed = registry.unregister(PeerId(1)).unwrap();
        assert_eq!(removed.name, "Ann");
        assert_eq!(registry.count(), 1);
        assert_eq!(registry.name_of(PeerId(1)), None);
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let mut registry = PeerRegistry::new();
        registry.register(PeerId(1), "Ann");

        assert!(registry.unregister(PeerId(99)).is_none());
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_empty_registry() {
        let registry = PeerRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.ordered_peers().count(), 0);
        assert_eq!(registry.name_of(PeerId(1)), None);
    }
}
