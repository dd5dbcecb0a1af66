//! Client-side view of the game session
//!
//! The client holds no game rules beyond what it needs to talk to the
//! server: whether it currently owes a guess, and the range that guess must
//! fall in. Everything else is decided and announced by the server.

use crate::input::parse_guess;
use log::warn;
use shared::Packet;

/// What the client should show after a packet from the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Announcement text to print
    Message(String),
    /// It is our turn; ask for a guess in `[1, upper_bound]`
    Prompt { upper_bound: i32 },
    Ignored,
}

/// What to do with a line the user typed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Send(Packet),
    /// Rejected locally; show the reason and keep prompting
    Invalid(String),
    NotYourTurn,
    Ignored,
}

#[derive(Debug, Default)]
pub struct ClientGameState {
    /// Set while a turn prompt is waiting for an answer
    pending_prompt: Option<i32>,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_my_turn(&self) -> bool {
        self.pending_prompt.is_some()
    }

    pub fn upper_bound(&self) -> Option<i32> {
        self.pending_prompt
    }

    pub fn apply_packet(&mut self, packet: Packet) -> ClientEvent {
        match packet {
            Packet::Broadcast { text } => ClientEvent::Message(text),
            Packet::TurnPrompt { upper_bound } => {
                self.pending_prompt = Some(upper_bound);
                ClientEvent::Prompt { upper_bound }
            }
            Packet::Handshake { .. } | Packet::Guess { .. } => {
                warn!("Ignoring client-only {} packet from server", packet.kind());
                ClientEvent::Ignored
            }
        }
    }

    /// Turns a typed line into a guess if one is owed
    pub fn submit_line(&mut self, line: &str) -> LineOutcome {
        let Some(upper_bound) = self.pending_prompt else {
            if line.trim().is_empty() {
                return LineOutcome::Ignored;
            }
            return LineOutcome::NotYourTurn;
        };

        match parse_guess(line, upper_bound) {
            Ok(value) => {
                self.pending_prompt = None;
                LineOutcome::Send(Packet::Guess { value })
            }
            Err(e) => LineOutcome::Invalid(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_becomes_message() {
        let mut state = ClientGameState::new();
        let event = state.apply_packet(Packet::Broadcast {
            text: "Bo has joined the game.".to_string(),
        });
        assert_eq!(event, ClientEvent::Message("Bo has joined the game.".to_string()));
        assert!(!state.is_my_turn());
    }

    #[test]
    fn test_prompt_then_valid_guess() {
        let mut state = ClientGameState::new();
        assert_eq!(
            state.apply_packet(Packet::TurnPrompt { upper_bound: 100 }),
            ClientEvent::Prompt { upper_bound: 100 }
        );
        assert!(state.is_my_turn());

        assert_eq!(
            state.submit_line(" 42 "),
            LineOutcome::Send(Packet::Guess { value: 42 })
        );
        assert!(!state.is_my_turn());
    }

    #[test]
    fn test_invalid_guess_keeps_prompt() {
        let mut state = ClientGameState::new();
        state.apply_packet(Packet::TurnPrompt { upper_bound: 10 });

        assert!(matches!(state.submit_line("eleven"), LineOutcome::Invalid(_)));
        assert!(matches!(state.submit_line("11"), LineOutcome::Invalid(_)));
        assert!(matches!(state.submit_line("0"), LineOutcome::Invalid(_)));
        assert_eq!(state.upper_bound(), Some(10));
    }

    #[test]
    fn test_line_without_prompt() {
        let mut state = ClientGameState::new();
        assert_eq!(state.submit_line("50"), LineOutcome::NotYourTurn);
        assert_eq!(state.submit_line("   "), LineOutcome::Ignored);
    }

    #[test]
    fn test_client_only_packets_ignored() {
        let mut state = ClientGameState::new();
        assert_eq!(
            state.apply_packet(Packet::Guess { value: 3 }),
            ClientEvent::Ignored
        );
    }
}
