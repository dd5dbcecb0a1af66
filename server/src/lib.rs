//! # Number Guessing Game Server
//!
//! This library provides the authoritative server for a turn-based
//! number-guessing game. Clients connect, register a display name, and are
//! admitted into a single shared session. Once enough players are present the
//! server draws a secret number, rotates an exclusive turn among the players,
//! judges each guess and announces the outcome to everyone.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Game State
//! The secret number never leaves the server. Clients only ever see turn
//! prompts and broadcast announcements, so a modified client cannot learn or
//! influence the answer.
//!
//! ### Turn Rotation
//! Turns rotate in join order. The same successor rule advances the turn after
//! a wrong guess and hands it on when the active player disconnects.
//!
//! ### Connection Lifecycle
//! UDP datagrams are grouped into connections with explicit connect and
//! disconnect frames plus heartbeat-based timeouts. Every connection ends with
//! exactly one disconnect event reaching the game session.
//!
//! ## Architecture Design
//!
//! ### Single-Task Session Ownership
//! The [`session::GameSession`] is owned by the task running
//! [`network::Server::run`]. Events arrive through one bounded queue and are
//! processed to completion one at a time, so the session needs no locks.
//!
//! ### Pure State Machine
//! The session turns each event into a list of actions (send, broadcast,
//! schedule cooldown) instead of touching sockets. The network layer carries
//! those actions out in order.
//!
//! ## Module Organization
//!
//! ### Registry Module (`registry`)
//! Peer ids and display names in join order.
//!
//! ### Scheduler Module (`scheduler`)
//! The active player and the "next after" rotation rule.
//!
//! ### Session Module (`session`)
//! Phases, quorum policy, secret drawing and guess validation.
//!
//! ### Client Manager Module (`client_manager`)
//! Connection table, peer id assignment, capacity and timeouts.
//!
//! ### Network Module (`network`)
//! UDP socket tasks and the main event loop.
//!
//! ### Config Module (`config`)
//! Server and session settings with reference defaults.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::with_bind_addr("127.0.0.1:1234".parse()?);
//!     let mut server = Server::new(config).await?;
//!
//!     // Runs until a ServerHandle asks it to stop
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Known Limitations
//!
//! There is no per-guess timeout: a slow active player holds up the rotation
//! until they guess or disconnect.

pub mod client_manager;
pub mod config;
pub mod network;
pub mod registry;
pub mod scheduler;
pub mod session;
