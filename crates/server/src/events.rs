use std::net::SocketAddr;

use duel::{ConnectionId, PlayerSlot, Winner};

#[derive(Debug, Clone)]
pub enum ServerEvent {
    ClientConnected {
        connection: ConnectionId,
        addr: SocketAddr,
    },
    ClientDisconnected {
        connection: ConnectionId,
        reason: DisconnectReason,
    },
    PlayerJoined {
        connection: ConnectionId,
        room: String,
        slot: PlayerSlot,
    },
    JoinDenied {
        connection: ConnectionId,
        room: String,
    },
    GameStarted {
        room: String,
    },
    GameFinished {
        room: String,
        winner: Winner,
    },
    RoomClosed {
        room: String,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    Graceful,
    Reset,
    Oversized,
}

impl DisconnectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisconnectReason::Graceful => "disconnected",
            DisconnectReason::Reset => "connection reset",
            DisconnectReason::Oversized => "dropped for an oversized frame",
        }
    }
}
