//! Connection tracking for the UDP transport
//!
//! This module turns loose datagrams into connections:
//! - Peer id assignment and capacity enforcement on connect
//! - Address lookup so inbound frames can be attributed to a peer
//! - Liveness tracking and timeout detection for silent peers
//!
//! Removal goes through a single `remove_client` call that reports whether
//! the peer was still present. Callers use that to deliver exactly one
//! disconnect to the game session per connection, whether the peer left
//! politely or timed out.

use crate::registry::PeerId;
use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::Instant;

/// A connected UDP peer
#[derive(Debug)]
pub struct Client {
    pub peer: PeerId,
    /// Where frames for this peer are sent
    pub addr: SocketAddr,
    /// Last time any frame arrived from this peer
    pub last_seen: Instant,
}

impl Client {
    pub fn new(peer: PeerId, addr: SocketAddr) -> Self {
        Self {
            peer,
            addr,
            last_seen: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// True if nothing has been heard from this peer within `timeout`
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Result of a connection attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A new connection was opened
    Accepted(PeerId),
    /// The address already had a connection; its id is reused
    Existing(PeerId),
    /// The server is at capacity
    Full,
}

/// Owns the table of live connections
///
/// Shared between the event loop, the sender task and the timeout checker
/// behind a `RwLock`. Game state never lives here.
pub struct ClientManager {
    clients: HashMap<PeerId, Client>,
    next_peer_id: u32,
    max_clients: usize,
    timeout: Duration,
}

impl ClientManager {
    pub fn new(max_clients: usize, timeout: Duration) -> Self {
        Self {
            clients: HashMap::new(),
            next_peer_id: 1,
            max_clients,
            timeout,
        }
    }

    /// Opens a connection for `addr`, or returns the one it already has
    pub fn add_client(&mut self, addr: SocketAddr) -> Admission {
        if let Some(peer) = self.find_client_by_addr(addr) {
            self.touch(peer);
            return Admission::Existing(peer);
        }

        if self.clients.len() >= self.max_clients {
            return Admission::Full;
        }

        let peer = PeerId(self.next_peer_id);
        self.next_peer_id += 1;

        info!("{} connected from {}", peer, addr);
        self.clients.insert(peer, Client::new(peer, addr));

        Admission::Accepted(peer)
    }

    /// Drops a connection. Returns false if it was already gone.
    pub fn remove_client(&mut self, peer: PeerId) -> bool {
        if let Some(client) = self.clients.remove(&peer) {
            info!("{} at {} disconnected", client.peer, client.addr);
            true
        } else {
            false
        }
    }

    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<PeerId> {
        self.clients
            .values()
            .find(|client| client.addr == addr)
            .map(|client| client.peer)
    }

    pub fn addr_of(&self, peer: PeerId) -> Option<SocketAddr> {
        self.clients.get(&peer).map(|client| client.addr)
    }

    /// Records activity for a peer; false if the peer is unknown
    pub fn touch(&mut self, peer: PeerId) -> bool {
        match self.clients.get_mut(&peer) {
            Some(client) => {
                client.touch();
                true
            }
            None => false,
        }
    }

    /// Removes and returns every peer that has gone silent
    pub fn check_timeouts(&mut self) -> Vec<PeerId> {
        let timed_out: Vec<PeerId> = self
            .clients
            .values()
            .filter(|client| client.is_timed_out(self.timeout))
            .map(|client| client.peer)
            .collect();

        for peer in &timed_out {
            self.remove_client(*peer);
        }

        timed_out
    }

    /// Every live connection, for broadcasting
    pub fn get_client_addrs(&self) -> Vec<(PeerId, SocketAddr)> {
        self.clients
            .values()
            .map(|client| (client.peer, client.addr))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    fn manager(max_clients: usize) -> ClientManager {
        ClientManager::new(max_clients, Duration::from_secs(5))
    }

    #[test]
    fn test_client_timeout() {
        let mut client = Client::new(PeerId(1), test_addr());
        assert!(!client.is_timed_out(Duration::from_secs(1)));

        client.last_seen = Instant::now() - Duration::from_secs(2);
        assert!(client.is_timed_out(Duration::from_secs(1)));

        client.touch();
        assert!(!client.is_timed_out(Duration::from_secs(1)));
    }

    #[test]
    fn test_add_multiple_clients() {
        let mut manager = manager(3);

        assert_eq!(manager.add_client(test_addr()), Admission::Accepted(PeerId(1)));
        assert_eq!(manager.add_client(test_addr2()), Admission::Accepted(PeerId(2)));
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.addr_of(PeerId(2)), Some(test_addr2()));
    }

    #[test]
    fn test_repeated_connect_reuses_peer() {
        let mut manager = manager(2);

        assert_eq!(manager.add_client(test_addr()), Admission::Accepted(PeerId(1)));
        assert_eq!(manager.add_client(test_addr()), Admission::Existing(PeerId(1)));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_add_client_max_capacity() {
        let mut manager = manager(1);

        assert_eq!(manager.add_client(test_addr()), Admission::Accepted(PeerId(1)));
        assert_eq!(manager.add_client(test_addr2()), Admission::Full);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_peer_ids_are_not_reused() {
        let mut manager = manager(2);

        manager.add_client(test_addr());
        assert!(manager.remove_client(PeerId(1)));
        assert_eq!(manager.add_client(test_addr()), Admission::Accepted(PeerId(2)));
    }

    #[test]
    fn test_remove_client_reports_once() {
        let mut manager = manager(2);
        manager.add_client(test_addr());

        assert!(manager.remove_client(PeerId(1)));
        assert!(!manager.remove_client(PeerId(1)));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_find_client_by_addr() {
        let mut manager = manager(2);
        manager.add_client(test_addr());
        manager.add_client(test_addr2());

        assert_eq!(manager.find_client_by_addr(test_addr2()), Some(PeerId(2)));

        let unknown: SocketAddr = "192.168.1.1:9999".parse().unwrap();
        assert_eq!(manager.find_client_by_addr(unknown), None);
    }

    #[test]
    fn test_check_timeouts_removes_silent_peers() {
        let mut manager = manager(2);
        manager.add_client(test_addr());
        manager.add_client(test_addr2());

        if let Some(client) = manager.clients.get_mut(&PeerId(1)) {
            client.last_seen = Instant::now() - Duration::from_secs(10);
        }

        assert_eq!(manager.check_timeouts(), vec![PeerId(1)]);
        assert_eq!(manager.len(), 1);
        assert!(manager.check_timeouts().is_empty());
    }

    #[test]
    fn test_touch_unknown_peer() {
        let mut manager = manager(1);
        assert!(!manager.touch(PeerId(5)));
    }
}
