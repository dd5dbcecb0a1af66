//! Server and session settings

use shared::{CLIENT_TIMEOUT, DEFAULT_PORT, DEFAULT_UPPER_BOUND, MAX_PEERS};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Game rules for a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Connected players needed before a round starts
    pub min_players: usize,
    /// Secrets and guesses live in `[1, upper_bound]`
    pub upper_bound: i32,
    /// Pause between the end of a round and the next quorum check
    pub cooldown: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            upper_bound: DEFAULT_UPPER_BOUND,
            cooldown: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub max_clients: usize,
    pub client_timeout: Duration,
    pub event_queue_capacity: usize,
    pub session: SessionConfig,
}

impl ServerConfig {
    pub fn with_bind_addr(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            ..Self::default()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            max_clients: MAX_PEERS,
            client_timeout: CLIENT_TIMEOUT,
            event_queue_capacity: 1024,
            session: SessionConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_deployment() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 1234);
        assert_eq!(config.max_clients, 32);
        assert_eq!(config.session.min_players, 2);
        assert_eq!(config.session.upper_bound, 100);
    }

    #[test]
    fn test_with_bind_addr_keeps_other_defaults() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let config = ServerConfig::with_bind_addr(addr);
        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.session, SessionConfig::default());
    }
}
