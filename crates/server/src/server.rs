use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};

use duel::{
    ConnectionId, FrameError, GameAction, NetworkStats, Outgoing, Packet, PacketLossSimulation,
    PacketReader, PacketType, RoomInfo, RoomRegistry, Winner, write_packet,
};

use crate::config::ServerConfig;
use crate::events::{DisconnectReason, ServerEvent};

const STATS_REFRESH: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Default)]
pub struct ServerStats {
    pub uptime_secs: u64,
    pub connection_count: usize,
    pub player_count: usize,
    pub rooms: Vec<RoomInfo>,
    pub network_stats: NetworkStats,
    pub resync_probability: f64,
    pub packet_loss: Option<PacketLossSimulation>,
}

/// What connection tasks tell the relay.
#[derive(Debug)]
enum RelayMessage {
    Connected {
        connection: ConnectionId,
        addr: SocketAddr,
        outbound: mpsc::UnboundedSender<Packet>,
    },
    Inbound {
        connection: ConnectionId,
        packet: Packet,
    },
    Disconnected {
        connection: ConnectionId,
        reason: DisconnectReason,
    },
}

pub struct RelayServer {
    listener: TcpListener,
    config: ServerConfig,
    events_tx: mpsc::UnboundedSender<ServerEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<ServerEvent>>,
    stats_tx: watch::Sender<ServerStats>,
}

impl RelayServer {
    pub async fn bind(config: ServerConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(&config.bind_addr).await?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (stats_tx, _) = watch::channel(ServerStats {
            resync_probability: config.resync_probability,
            packet_loss: config.packet_loss.clone(),
            ..Default::default()
        });

        Ok(Self {
            listener,
            config,
            events_tx,
            events_rx: Some(events_rx),
            stats_tx,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Events are only produced for whoever takes the receiver.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<ServerEvent>> {
        self.events_rx.take()
    }

    pub fn stats(&self) -> watch::Receiver<ServerStats> {
        self.stats_tx.subscribe()
    }

    /// Accepts connections forever. Every room mutation happens on the one
    /// relay task spawned here.
    pub async fn run(self) -> io::Result<()> {
        let Self {
            listener,
            config,
            events_tx,
            events_rx,
            stats_tx,
        } = self;
        drop(events_rx);

        let (relay_tx, relay_rx) = mpsc::unbounded_channel();
        let relay = Relay::new(&config, events_tx.clone(), stats_tx);
        tokio::spawn(relay.run(relay_rx));

        let mut next_connection: ConnectionId = 1;
        loop {
            let (stream, addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    log::warn!("accept failed: {}", e);
                    let _ = events_tx.send(ServerEvent::Error {
                        message: format!("Accept failed: {}", e),
                    });
                    continue;
                }
            };

            let connection = next_connection;
            next_connection += 1;
            if let Err(e) = stream.set_nodelay(true) {
                log::debug!("set_nodelay failed for {}: {}", addr, e);
            }
            tokio::spawn(handle_connection(connection, stream, addr, relay_tx.clone()));
        }
    }
}

async fn handle_connection(
    connection: ConnectionId,
    stream: TcpStream,
    addr: SocketAddr,
    relay_tx: mpsc::UnboundedSender<RelayMessage>,
) {
    let (read_half, mut write_half) = stream.into_split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Packet>();

    if relay_tx
        .send(RelayMessage::Connected {
            connection,
            addr,
            outbound: outbound_tx,
        })
        .is_err()
    {
        return;
    }

    let writer = tokio::spawn(async move {
        while let Some(packet) = outbound_rx.recv().await {
            if let Err(e) = write_packet(&mut write_half, &packet).await {
                log::debug!("write to connection {} failed: {}", connection, e);
                break;
            }
        }
    });

    let mut reader = PacketReader::new(read_half);
    let reason = loop {
        match reader.next_packet().await {
            Ok(Some(packet)) => {
                if relay_tx
                    .send(RelayMessage::Inbound { connection, packet })
                    .is_err()
                {
                    break DisconnectReason::Graceful;
                }
            }
            Ok(None) => break DisconnectReason::Graceful,
            Err(FrameError::TooLarge(len)) => {
                log::warn!("connection {} sent a {} byte frame", connection, len);
                break DisconnectReason::Oversized;
            }
            Err(e) => {
                log::debug!("read from connection {} failed: {}", connection, e);
                break DisconnectReason::Reset;
            }
        }
    };

    let _ = relay_tx.send(RelayMessage::Disconnected { connection, reason });
    writer.abort();
}

/// Owns the registry and the outbound half of every connection.
struct Relay {
    registry: RoomRegistry,
    senders: HashMap<ConnectionId, mpsc::UnboundedSender<Packet>>,
    packet_loss: Option<PacketLossSimulation>,
    rng: StdRng,
    network_stats: NetworkStats,
    events: mpsc::UnboundedSender<ServerEvent>,
    stats: watch::Sender<ServerStats>,
    started: Instant,
}

impl Relay {
    fn new(
        config: &ServerConfig,
        events: mpsc::UnboundedSender<ServerEvent>,
        stats: watch::Sender<ServerStats>,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            registry: RoomRegistry::new(config.resync_probability),
            senders: HashMap::new(),
            packet_loss: config.packet_loss.clone().filter(|sim| sim.enabled),
            rng,
            network_stats: NetworkStats::default(),
            events,
            stats,
            started: Instant::now(),
        }
    }

    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<RelayMessage>) {
        let mut refresh = tokio::time::interval(STATS_REFRESH);
        loop {
            tokio::select! {
                message = inbox.recv() => {
                    let Some(message) = message else { break };
                    self.handle(message);
                }
                _ = refresh.tick() => {}
            }
            self.publish_stats();
        }
    }

    fn handle(&mut self, message: RelayMessage) {
        match message {
            RelayMessage::Connected {
                connection,
                addr,
                outbound,
            } => {
                log::info!("connection {} from {}", connection, addr);
                self.senders.insert(connection, outbound);
                self.emit(ServerEvent::ClientConnected { connection, addr });
            }
            RelayMessage::Inbound { connection, packet } => {
                self.network_stats.packets_received += 1;
                self.handle_packet(connection, packet);
            }
            RelayMessage::Disconnected { connection, reason } => {
                log::info!("connection {} {}", connection, reason.as_str());
                let room = self.registry.membership(connection).map(|m| m.room.clone());
                let out = self.registry.leave(connection);
                self.senders.remove(&connection);

                if let Some(room) = room {
                    if out.iter().any(|o| {
                        o.packet.payload
                            == PacketType::GameOver {
                                winner: Winner::Disconnect,
                            }
                    }) {
                        self.emit(ServerEvent::GameFinished {
                            room: room.clone(),
                            winner: Winner::Disconnect,
                        });
                    }
                    if self.registry.get(&room).is_none() {
                        self.emit(ServerEvent::RoomClosed { room });
                    }
                }
                self.deliver(out);
                self.emit(ServerEvent::ClientDisconnected { connection, reason });
            }
        }
    }

    fn handle_packet(&mut self, connection: ConnectionId, packet: Packet) {
        let observed = match &packet.payload {
            PacketType::Join { room } => Some(room.clone()),
            PacketType::GameStart { room } => Some(room.clone()),
            PacketType::GameAction {
                room,
                action: GameAction::GameOver { winner, .. },
                ..
            } => {
                self.emit(ServerEvent::GameFinished {
                    room: room.clone(),
                    winner: *winner,
                });
                None
            }
            _ => None,
        };

        let out = self.registry.handle(connection, packet, &mut self.rng);

        if let Some(room) = observed {
            for delivery in out.iter().filter(|o| o.to == connection) {
                match &delivery.packet.payload {
                    PacketType::Joined { client_id, .. } => {
                        self.emit(ServerEvent::PlayerJoined {
                            connection,
                            room: room.clone(),
                            slot: *client_id,
                        });
                    }
                    PacketType::JoinDenied { .. } => {
                        self.emit(ServerEvent::JoinDenied {
                            connection,
                            room: room.clone(),
                        });
                    }
                    PacketType::GameStarted => {
                        self.emit(ServerEvent::GameStarted { room: room.clone() });
                    }
                    _ => {}
                }
            }
        }

        self.deliver(out);
    }

    fn deliver(&mut self, out: Vec<Outgoing>) {
        for Outgoing { to, packet } in out {
            if matches!(packet.payload, PacketType::GameAction { .. })
                && self
                    .packet_loss
                    .as_ref()
                    .is_some_and(|sim| sim.should_drop(&mut self.rng))
            {
                self.network_stats.packets_lost += 1;
                continue;
            }
            if matches!(packet.payload, PacketType::GameStateSync(_)) {
                self.network_stats.resyncs_sent += 1;
            }

            let Some(sender) = self.senders.get(&to) else {
                continue;
            };
            if sender.send(packet).is_ok() {
                self.network_stats.packets_sent += 1;
            }
        }
    }

    fn emit(&self, event: ServerEvent) {
        let _ = self.events.send(event);
    }

    fn publish_stats(&self) {
        self.stats.send_replace(ServerStats {
            uptime_secs: self.started.elapsed().as_secs(),
            connection_count: self.senders.len(),
            player_count: self.registry.player_count(),
            rooms: self.registry.infos(),
            network_stats: self.network_stats.clone(),
            resync_probability: self.registry.resync_probability(),
            packet_loss: self.packet_loss.clone(),
        });
    }
}
