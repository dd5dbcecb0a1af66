//! Connection-level frames carried in UDP datagrams
//!
//! Frames give plain UDP the connect / receive / disconnect lifecycle the game
//! session expects. Game packets travel opaquely inside [`Frame::Payload`] and
//! are decoded separately by [`crate::Packet::decode`].

use crate::Packet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum Frame {
    // Client -> server
    Connect { protocol_version: u32 },
    Heartbeat,
    Disconnect,

    // Server -> client
    Accepted { peer_id: u32 },
    Rejected { reason: String },
    Disconnected,

    // Either direction
    Payload { data: Vec<u8> },
}

impl Frame {
    /// Wraps an encoded game packet
    pub fn payload(packet: &Packet) -> Self {
        Frame::Payload {
            data: packet.encode(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_serialization_connect() {
        let frame = Frame::Connect {
            protocol_version: crate::PROTOCOL_VERSION,
        };
        let bytes = frame.to_bytes().unwrap();
        assert_eq!(Frame::from_bytes(&bytes).unwrap(), frame);
    }

    #[test]
    fn test_payload_carries_packet_bytes() {
        let packet = Packet::TurnPrompt { upper_bound: 100 };
        let frame = Frame::payload(&packet);
        let bytes = frame.to_bytes().unwrap();

        match Frame::from_bytes(&bytes).unwrap() {
            Frame::Payload { data } => assert_eq!(Packet::decode(&data).unwrap(), packet),
            other => panic!("Wrong frame type after deserialization: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_frame_rejected() {
        let bytes = Frame::Accepted { peer_id: 3 }.to_bytes().unwrap();

        assert!(Frame::from_bytes(&bytes[..bytes.len() / 2]).is_err());
        assert!(Frame::from_bytes(&[]).is_err());
        assert!(Frame::from_bytes(&[0xFF, 0xFF, 0xFF, 0xFF]).is_err());
    }
}
