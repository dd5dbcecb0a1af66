use crate::console::Console;
use crate::game::{ClientEvent, ClientGameState, LineOutcome};
use log::{debug, error, info, warn};
use shared::{
    Frame, Packet, CONNECT_TIMEOUT, DISCONNECT_GRACE, HEARTBEAT_INTERVAL, MAX_DATAGRAM_SIZE,
    PROTOCOL_VERSION,
};
use std::io::Stdout;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout};

pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    name: String,
    peer_id: Option<u32>,
    connected: bool,

    game_state: ClientGameState,
    console: Console<Stdout>,
}

impl Client {
    pub async fn new(server_addr: &str, name: String) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let server_addr = server_addr.parse()?;

        Ok(Client {
            socket,
            server_addr,
            name,
            peer_id: None,
            connected: false,
            game_state: ClientGameState::new(),
            console: Console::stdout(),
        })
    }

    pub fn peer_id(&self) -> Option<u32> {
        self.peer_id
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Opens the connection, giving up after [`CONNECT_TIMEOUT`]
    pub async fn connect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Connecting to server {}...", self.server_addr);

        let peer_id = match timeout(CONNECT_TIMEOUT, self.await_acceptance()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(format!("Connection to {} failed: no answer", self.server_addr).into())
            }
        };

        info!("Connected! Peer ID: {}", peer_id);
        self.peer_id = Some(peer_id);
        self.connected = true;
        Ok(())
    }

    /// Sends Connect once per heartbeat interval until the server answers
    async fn await_acceptance(&self) -> Result<u32, Box<dyn std::error::Error>> {
        let mut retry = interval(HEARTBEAT_INTERVAL);
        let mut buffer = [0u8; MAX_DATAGRAM_SIZE];

        loop {
            tokio::select! {
                _ = retry.tick() => {
                    self.send_frame(&Frame::Connect { protocol_version: PROTOCOL_VERSION }).await?;
                },

                result = self.socket.recv_from(&mut buffer) => {
                    let (len, from) = result?;
                    if from != self.server_addr {
                        continue;
                    }
                    match Frame::from_bytes(&buffer[..len]) {
                        Ok(Frame::Accepted { peer_id }) => return Ok(peer_id),
                        Ok(Frame::Rejected { reason }) => {
                            return Err(format!("Connection rejected: {}", reason).into())
                        }
                        Ok(other) => debug!("Ignoring {:?} while connecting", other),
                        Err(e) => warn!("Malformed frame from server: {}", e),
                    }
                },
            }
        }
    }

    async fn send_frame(&self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let data = frame.to_bytes()?;
        self.socket.send_to(&data, self.server_addr).await?;
        Ok(())
    }

    async fn send_packet(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error>> {
        self.send_frame(&Frame::payload(packet)).await
    }

    /// Returns false once the server has closed the connection
    fn handle_frame(&mut self, frame: Frame) -> Result<bool, Box<dyn std::error::Error>> {
        match frame {
            Frame::Payload { data } => match Packet::decode(&data) {
                Ok(packet) => self.handle_packet(packet)?,
                Err(e) => warn!("Dropping undecodable packet: {}", e),
            },

            Frame::Disconnected => {
                warn!("Server closed the connection");
                self.console.message("Disconnected by the server.")?;
                self.connected = false;
                self.peer_id = None;
                return Ok(false);
            }

            Frame::Rejected { reason } => {
                warn!("Server rejected us: {}", reason);
                self.console.message(&format!("Disconnected: {}", reason))?;
                self.connected = false;
                self.peer_id = None;
                return Ok(false);
            }

            Frame::Accepted { .. } | Frame::Heartbeat => {}

            other => warn!("Unexpected frame from server: {:?}", other),
        }

        Ok(true)
    }

    fn handle_packet(&mut self, packet: Packet) -> std::io::Result<()> {
        match self.game_state.apply_packet(packet) {
            ClientEvent::Message(text) => self.console.message(&text),
            ClientEvent::Prompt { upper_bound } => self
                .console
                .show_prompt(format!("Please enter your guess (1-{}):", upper_bound)),
            ClientEvent::Ignored => Ok(()),
        }
    }

    async fn handle_line(&mut self, line: &str) -> Result<(), Box<dyn std::error::Error>> {
        self.console.line_entered();
        match self.game_state.submit_line(line) {
            LineOutcome::Send(packet) => {
                self.console.clear_prompt();
                self.console.message("Sending your guess.")?;
                self.send_packet(&packet).await?;
            }
            LineOutcome::Invalid(reason) => {
                self.console.message(&reason)?;
            }
            LineOutcome::NotYourTurn => {
                self.console.message("It is not your turn.")?;
            }
            LineOutcome::Ignored => {}
        }
        Ok(())
    }

    /// Sends Disconnect and waits up to [`DISCONNECT_GRACE`] for the ack
    async fn leave(&mut self) {
        info!("Leaving game");

        if let Err(e) = self.send_frame(&Frame::Disconnect).await {
            warn!("Failed to send disconnect: {}", e);
            self.connected = false;
            return;
        }

        let server_addr = self.server_addr;
        let socket = &self.socket;
        let acknowledged = timeout(DISCONNECT_GRACE, async {
            let mut buffer = [0u8; MAX_DATAGRAM_SIZE];
            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, from)) if from == server_addr => {
                        if matches!(Frame::from_bytes(&buffer[..len]), Ok(Frame::Disconnected)) {
                            return;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        return;
                    }
                }
            }
        })
        .await
        .is_ok();

        if acknowledged {
            let _ = self.console.message("Disconnection succeeded.");
        } else {
            warn!("No disconnect acknowledgment, dropping connection");
        }

        self.connected = false;
        self.peer_id = None;
    }

    /// Plays until input ends, Ctrl+C, or the server drops us
    pub async fn run(
        &mut self,
        mut lines: mpsc::Receiver<String>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.connect().await?;
        self.send_packet(&Packet::Handshake {
            display_name: self.name.clone(),
        })
        .await?;

        let mut heartbeat = interval(HEARTBEAT_INTERVAL);
        let mut buffer = [0u8; MAX_DATAGRAM_SIZE];

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                result = self.socket.recv_from(&mut buffer) => {
                    match result {
                        Ok((len, from)) if from == self.server_addr => {
                            match Frame::from_bytes(&buffer[..len]) {
                                Ok(frame) => {
                                    if !self.handle_frame(frame)? {
                                        break;
                                    }
                                }
                                Err(e) => warn!("Malformed frame from server: {}", e),
                            }
                        }
                        Ok((_, from)) => debug!("Ignoring datagram from {}", from),
                        Err(e) => error!("Error receiving packet: {}", e),
                    }
                },

                line = lines.recv() => {
                    match line {
                        Some(line) => self.handle_line(&line).await?,
                        None => {
                            info!("Input closed");
                            break;
                        }
                    }
                },

                _ = heartbeat.tick() => {
                    if let Err(e) = self.send_frame(&Frame::Heartbeat).await {
                        error!("Error sending heartbeat: {}", e);
                    }
                },

                _ = &mut ctrl_c => {
                    info!("Received Ctrl+C");
                    break;
                },
            }

            self.console.render()?;
        }

        if self.connected {
            self.leave().await;
        }

        Ok(())
    }
}
