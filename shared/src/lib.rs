//! Wire types shared by the guessing-game server and client

use std::time::Duration;

pub mod frame;
pub mod packet;

pub use frame::Frame;
pub use packet::{DecodeError, Packet};

/// Bumped whenever [`Frame`] or [`Packet`] layouts change
pub const PROTOCOL_VERSION: u32 = 1;

pub const DEFAULT_PORT: u16 = 1234;
pub const DEFAULT_UPPER_BOUND: i32 = 100;
pub const MAX_PEERS: usize = 32;
/// Longest display name, in characters, the server will keep
pub const MAX_NAME_LEN: usize = 32;

/// Largest datagram either side will read
pub const MAX_DATAGRAM_SIZE: usize = 2048;

/// How often an idle client proves it is still there
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);
/// Silence after which the server forces a peer down
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);
/// How long a client waits for the server to accept a connection
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// How long a leaving client waits for the disconnect acknowledgment
pub const DISCONNECT_GRACE: Duration = Duration::from_secs(3);
