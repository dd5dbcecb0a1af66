//! Binary codec for game packets
//!
//! Every packet starts with a one-byte discriminant followed by a
//! variant-specific payload:
//!
//! | Discriminant | Variant      | Payload                       |
//! |--------------|--------------|-------------------------------|
//! | 1            | `Handshake`  | display name, NUL-terminated  |
//! | 2            | `Guess`      | `i32`, native byte order      |
//! | 3            | `Broadcast`  | text, NUL-terminated          |
//! | 4            | `TurnPrompt` | `i32`, native byte order      |
//!
//! Decoding consumes the whole buffer. Bytes left over after the payload are
//! an error, so a packet never relies on the transport for its own length.
//!
//! Integers use the host byte order. Client and server are expected to run on
//! architectures with the same endianness.

use thiserror::Error;

const HANDSHAKE: u8 = 1;
const GUESS: u8 = 2;
const BROADCAST: u8 = 3;
const TURN_PROMPT: u8 = 4;

const INT_WIDTH: usize = std::mem::size_of::<i32>();

/// Messages exchanged between the game server and its clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Client -> server, sent once right after connecting
    Handshake { display_name: String },
    /// Server -> one client: guess a number in `[1, upper_bound]`
    TurnPrompt { upper_bound: i32 },
    /// Client -> server, only valid from the active peer
    Guess { value: i32 },
    /// Server -> all clients, free-form status text
    Broadcast { text: String },
}

/// Reasons a buffer could not be decoded into a [`Packet`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown packet type {0}")]
    UnknownPacketType(u8),
    #[error("packet is truncated")]
    TruncatedPacket,
    #[error("{0} trailing bytes after packet payload")]
    TrailingBytes(usize),
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,
}

impl Packet {
    /// Wire discriminant of this variant
    pub fn discriminant(&self) -> u8 {
        match self {
            Packet::Handshake { .. } => HANDSHAKE,
            Packet::Guess { .. } => GUESS,
            Packet::Broadcast { .. } => BROADCAST,
            Packet::TurnPrompt { .. } => TURN_PROMPT,
        }
    }

    /// Short name for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Packet::Handshake { .. } => "Handshake",
            Packet::Guess { .. } => "Guess",
            Packet::Broadcast { .. } => "Broadcast",
            Packet::TurnPrompt { .. } => "TurnPrompt",
        }
    }

    /// Exact number of bytes [`Packet::encode`] produces
    pub fn encoded_len(&self) -> usize {
        1 + match self {
            Packet::Handshake { display_name } => wire_str(display_name).len() + 1,
            Packet::Broadcast { text } => wire_str(text).len() + 1,
            Packet::Guess { .. } | Packet::TurnPrompt { .. } => INT_WIDTH,
        }
    }

    /// Encodes the packet into a fresh buffer.
    ///
    /// String fields end at their first NUL byte, since NUL is the field
    /// terminator on the wire.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.push(self.discriminant());

        match self {
            Packet::Handshake { display_name } => put_str(&mut buf, display_name),
            Packet::Broadcast { text } => put_str(&mut buf, text),
            Packet::Guess { value } => buf.extend_from_slice(&value.to_ne_bytes()),
            Packet::TurnPrompt { upper_bound } => {
                buf.extend_from_slice(&upper_bound.to_ne_bytes())
            }
        }

        buf
    }

    /// Decodes one packet, requiring the buffer to be consumed exactly
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(bytes);

        let packet = match reader.u8()? {
            HANDSHAKE => Packet::Handshake {
                display_name: reader.string()?,
            },
            GUESS => Packet::Guess {
                value: reader.i32()?,
            },
            BROADCAST => Packet::Broadcast {
                text: reader.string()?,
            },
            TURN_PROMPT => Packet::TurnPrompt {
                upper_bound: reader.i32()?,
            },
            other => return Err(DecodeError::UnknownPacketType(other)),
        };

        reader.finish()?;
        Ok(packet)
    }
}

fn wire_str(s: &str) -> &[u8] {
    let bytes = s.as_bytes();
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    &bytes[..end]
}

fn put_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(wire_str(s));
    buf.push(0);
}

/// Cursor over an inbound buffer
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        let byte = *self.buf.get(self.pos).ok_or(DecodeError::TruncatedPacket)?;
        self.pos += 1;
        Ok(byte)
    }

    fn i32(&mut self) -> Result<i32, DecodeError> {
        let end = self.pos + INT_WIDTH;
        let raw: [u8; INT_WIDTH] = self
            .buf
            .get(self.pos..end)
            .and_then(|slice| slice.try_into().ok())
            .ok_or(DecodeError::TruncatedPacket)?;
        self.pos = end;
        Ok(i32::from_ne_bytes(raw))
    }

    fn string(&mut self) -> Result<String, DecodeError> {
        let rest = &self.buf[self.pos..];
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(DecodeError::TruncatedPacket)?;
        let text = std::str::from_utf8(&rest[..nul]).map_err(|_| DecodeError::InvalidUtf8)?;
        self.pos += nul + 1;
        Ok(text.to_owned())
    }

    fn finish(self) -> Result<(), DecodeError> {
        match self.buf.len() - self.pos {
            0 => Ok(()),
            extra => Err(DecodeError::TrailingBytes(extra)),
        }
    }
}
