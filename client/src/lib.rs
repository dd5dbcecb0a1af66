//! # Number Guessing Game Client
//!
//! A terminal client for the turn-based number-guessing server. It connects,
//! registers a display name, prints every announcement the server broadcasts
//! and asks the player for a guess whenever the server grants them the turn.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! Tracks whether a turn prompt is outstanding and turns typed lines into
//! guesses, local rejections or a "not your turn" notice.
//!
//! ### Input Module (`input`)
//! Reads stdin on its own thread and parses guesses.
//!
//! ### Console Module (`console`)
//! Prints announcements and redraws the guess prompt when output lands on top
//! of it.
//!
//! ### Network Module (`network`)
//! Connection setup, heartbeats, the main select loop and graceful leave.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::{input, network};
//! use std::io::BufReader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let lines = input::spawn_line_reader(BufReader::new(std::io::stdin()), 16);
//!     let mut client = network::Client::new("127.0.0.1:1234", "Ann".to_string()).await?;
//!     client.run(lines).await?;
//!     Ok(())
//! }
//! ```

pub mod console;
pub mod game;
pub mod input;
pub mod network;
