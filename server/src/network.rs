//! Server network layer bridging UDP datagrams and the game session

use crate::client_manager::{Admission, ClientManager};
use crate::config::ServerConfig;
use crate::registry::PeerId;
use crate::session::{GameSession, SessionAction, SessionEvent};
use log::{debug, error, info, warn};
use shared::{Frame, MAX_DATAGRAM_SIZE, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

/// Messages sent from network tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    FrameReceived { frame: Frame, addr: SocketAddr },
    ClientTimeout { peer: PeerId },
    CooldownElapsed,
    Shutdown,
}

/// Messages sent from the main loop to the sender task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameMessage {
    SendFrame {
        frame: Frame,
        addr: SocketAddr,
    },
    /// Recipients are fixed when the broadcast is queued, so peers that
    /// connect later never see it.
    BroadcastFrame {
        frame: Frame,
        recipients: Vec<(PeerId, SocketAddr)>,
    },
}

/// Cloneable handle for stopping a running [`Server`]
#[derive(Clone)]
pub struct ServerHandle {
    server_tx: mpsc::Sender<ServerMessage>,
}

impl ServerHandle {
    pub async fn shutdown(&self) {
        if self.server_tx.send(ServerMessage::Shutdown).await.is_err() {
            debug!("Server already stopped");
        }
    }
}

/// UDP front end owning the single game session
///
/// All session mutation happens on the task that calls [`Server::run`].
/// Helper tasks only move datagrams in and out and report timeouts.
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    session: GameSession,
    config: ServerConfig,

    // Communication channels
    server_tx: mpsc::Sender<ServerMessage>,
    server_rx: mpsc::Receiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: Option<mpsc::UnboundedReceiver<GameMessage>>,
}

impl Server {
    pub async fn new(config: ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let session = GameSession::new(config.session.clone());
        Self::with_session(config, session).await
    }

    /// Binds the socket and wraps an existing session
    pub async fn with_session(
        config: ServerConfig,
        session: GameSession,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(config.bind_addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::channel(config.event_queue_capacity);
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(
                config.max_clients,
                config.client_timeout,
            ))),
            session,
            config,
            server_tx,
            server_rx,
            game_tx,
            game_rx: Some(game_rx),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            server_tx: self.server_tx.clone(),
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Spawns task that continuously listens for incoming frames
    fn spawn_network_receiver(&self) -> JoinHandle<()> {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; MAX_DATAGRAM_SIZE];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => match Frame::from_bytes(&buffer[..len]) {
                        Ok(frame) => {
                            let message = ServerMessage::FrameReceived { frame, addr };
                            if server_tx.send(message).await.is_err() {
                                error!("Main loop is gone, stopping receiver");
                                break;
                            }
                        }
                        Err(e) => warn!("Failed to deserialize frame from {}: {}", addr, e),
                    },
                    Err(e) => {
                        error!("Error receiving datagram: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        })
    }

    /// Spawns task that drains the outgoing frame queue in order
    fn spawn_network_sender(&mut self) -> Option<JoinHandle<()>> {
        let socket = Arc::clone(&self.socket);
        let mut game_rx = self.game_rx.take()?;

        Some(tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendFrame { frame, addr } => {
                        if let Err(e) = Self::send_frame_impl(&socket, &frame, addr).await {
                            error!("Failed to send frame to {}: {}", addr, e);
                        }
                    }
                    GameMessage::BroadcastFrame { frame, recipients } => {
                        for (peer, addr) in recipients {
                            if let Err(e) = Self::send_frame_impl(&socket, &frame, addr).await {
                                error!("Failed to send to {}: {}", peer, e);
                            }
                        }
                    }
                }
            }
        }))
    }

    /// Spawns task that forces silent peers down
    fn spawn_timeout_checker(&self) -> JoinHandle<()> {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts()
                };

                for peer in timed_out {
                    if server_tx
                        .send(ServerMessage::ClientTimeout { peer })
                        .await
                        .is_err()
                    {
                        error!("Main loop is gone, stopping timeout checker");
                        return;
                    }
                }
            }
        })
    }

    async fn send_frame_impl(
        socket: &UdpSocket,
        frame: &Frame,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = frame.to_bytes()?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn queue(&self, message: GameMessage) {
        if let Err(e) = self.game_tx.send(message) {
            error!("Failed to queue frame for sending: {}", e);
        }
    }

    fn send_frame(&self, frame: Frame, addr: SocketAddr) {
        self.queue(GameMessage::SendFrame { frame, addr });
    }

    /// Looks up the sender of a frame and marks it alive
    async fn touch_addr(&self, addr: SocketAddr) -> Option<PeerId> {
        let mut clients = self.clients.write().await;
        let peer = clients.find_client_by_addr(addr)?;
        clients.touch(peer);
        Some(peer)
    }

    /// Applies one inbound frame to the connection table and the session
    async fn handle_frame(&mut self, frame: Frame, addr: SocketAddr) {
        match frame {
            Frame::Connect { protocol_version } => {
                if protocol_version != PROTOCOL_VERSION {
                    warn!(
                        "Rejecting {} with protocol version {} (expected {})",
                        addr, protocol_version, PROTOCOL_VERSION
                    );
                    let reason = "Protocol version mismatch".to_string();
                    self.send_frame(Frame::Rejected { reason }, addr);
                    return;
                }

                let admission = {
                    let mut clients = self.clients.write().await;
                    clients.add_client(addr)
                };

                match admission {
                    Admission::Accepted(peer) => {
                        self.send_frame(Frame::Accepted { peer_id: peer.0 }, addr);
                        self.dispatch(SessionEvent::Connected(peer)).await;
                    }
                    Admission::Existing(peer) => {
                        debug!("Repeated connect from {}, re-acknowledging {}", addr, peer);
                        self.send_frame(Frame::Accepted { peer_id: peer.0 }, addr);
                    }
                    Admission::Full => {
                        warn!("Rejecting {}: server full", addr);
                        let reason = "Server full".to_string();
                        self.send_frame(Frame::Rejected { reason }, addr);
                    }
                }
            }

            Frame::Payload { data } => match self.touch_addr(addr).await {
                Some(peer) => self.dispatch(SessionEvent::Received { peer, data }).await,
                None => {
                    debug!("Payload from unconnected {}, telling it to go away", addr);
                    self.send_frame(Frame::Disconnected, addr);
                }
            },

            Frame::Heartbeat => {
                if self.touch_addr(addr).await.is_none() {
                    debug!("Heartbeat from unconnected {}, telling it to go away", addr);
                    self.send_frame(Frame::Disconnected, addr);
                }
            }

            Frame::Disconnect => {
                let peer = {
                    let mut clients = self.clients.write().await;
                    match clients.find_client_by_addr(addr) {
                        Some(peer) if clients.remove_client(peer) => Some(peer),
                        _ => None,
                    }
                };

                // Acknowledge even unknown addresses so the client can stop waiting.
                self.send_frame(Frame::Disconnected, addr);

                if let Some(peer) = peer {
                    self.dispatch(SessionEvent::Disconnected(peer)).await;
                }
            }

            other => {
                warn!("Unexpected client-bound frame {:?} from {}", other, addr);
            }
        }
    }

    /// Runs one session event and carries out the resulting actions
    async fn dispatch(&mut self, event: SessionEvent) {
        let actions = self.session.handle(event);

        for action in actions {
            match action {
                SessionAction::Send { peer, packet } => {
                    let addr = {
                        let clients = self.clients.read().await;
                        clients.addr_of(peer)
                    };
                    match addr {
                        Some(addr) => self.send_frame(Frame::payload(&packet), addr),
                        None => debug!("Dropping {} for departed {}", packet.kind(), peer),
                    }
                }
                SessionAction::Broadcast { packet } => {
                    let recipients = {
                        let clients = self.clients.read().await;
                        clients.get_client_addrs()
                    };
                    self.queue(GameMessage::BroadcastFrame {
                        frame: Frame::payload(&packet),
                        recipients,
                    });
                }
                SessionAction::ScheduleCooldown(delay) => self.schedule_cooldown(delay),
            }
        }
    }

    fn schedule_cooldown(&self, delay: Duration) {
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if server_tx.send(ServerMessage::CooldownElapsed).await.is_err() {
                debug!("Cooldown finished after server shutdown");
            }
        });
    }

    /// Main server loop; returns after [`ServerHandle::shutdown`]
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let mut tasks = vec![self.spawn_network_receiver(), self.spawn_timeout_checker()];
        tasks.extend(self.spawn_network_sender());

        info!(
            "Server started (max {} clients, quorum {}, numbers 1-{})",
            self.config.max_clients,
            self.session.config().min_players,
            self.session.config().upper_bound
        );

        while let Some(message) = self.server_rx.recv().await {
            match message {
                ServerMessage::FrameReceived { frame, addr } => {
                    self.handle_frame(frame, addr).await;
                }
                ServerMessage::ClientTimeout { peer } => {
                    info!("{} timed out", peer);
                    self.dispatch(SessionEvent::Disconnected(peer)).await;
                }
                ServerMessage::CooldownElapsed => {
                    self.dispatch(SessionEvent::CooldownElapsed).await;
                }
                ServerMessage::Shutdown => {
                    info!("Server shutting down");
                    break;
                }
            }
        }

        for task in tasks {
            task.abort();
        }

        Ok(())
    }
}
