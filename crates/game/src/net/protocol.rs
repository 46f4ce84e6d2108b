use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize, rancor};

use crate::board::Board;
use crate::state::{Cursor, GameState, PlayerSlot, RoomState, Winner};

pub const MAX_PACKET_SIZE: usize = 64 * 1024;
pub const PROTOCOL_VERSION: u32 = 1;
pub const PROTOCOL_MAGIC: u32 = 0x4455454C;
pub const DEFAULT_PORT: u16 = 27015;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct PacketHeader {
    pub magic: u32,
    pub version: u32,
}

impl Default for PacketHeader {
    fn default() -> Self {
        Self {
            magic: PROTOCOL_MAGIC,
            version: PROTOCOL_VERSION,
        }
    }
}

impl PacketHeader {
    pub fn is_valid(&self) -> bool {
        self.magic == PROTOCOL_MAGIC && self.version == PROTOCOL_VERSION
    }
}

/// Board-affecting traffic carries state, never commands.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum GameAction {
    Move {
        cursor: Cursor,
    },
    BoardSync {
        board: Board,
        score: u32,
        combo: Option<u32>,
    },
    GameOver {
        winner: Winner,
        loser: PlayerSlot,
    },
}

impl GameAction {
    pub fn board_sync(state: &GameState) -> Self {
        Self::BoardSync {
            board: state.board.clone(),
            score: state.score,
            combo: Some(state.combo),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::BoardSync { .. } => "board_sync",
            Self::GameOver { .. } => "game_over",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum PacketType {
    // client -> relay
    Join {
        room: String,
    },
    GameStart {
        room: String,
    },
    SendGarbage {
        room: String,
        lines: u32,
        target_player: PlayerSlot,
    },
    Chat {
        room: String,
        text: String,
    },

    // both directions; relayed verbatim to the other member
    GameAction {
        room: String,
        player_id: PlayerSlot,
        action: GameAction,
    },

    // relay -> client
    Joined {
        client_id: PlayerSlot,
        room_state: RoomState,
    },
    JoinDenied {
        reason: String,
    },
    ClientCount {
        count: u8,
    },
    GameStarted,
    GameStateSync(RoomState),
    GarbageReceived {
        lines: u32,
    },
    GameOver {
        winner: Winner,
    },
    ChatMessage {
        sender_id: PlayerSlot,
        text: String,
    },
}

impl PacketType {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::GameStart { .. } => "game_start",
            Self::SendGarbage { .. } => "send_garbage",
            Self::Chat { .. } => "chat",
            Self::GameAction { action, .. } => action.kind(),
            Self::Joined { .. } => "joined",
            Self::JoinDenied { .. } => "join_denied",
            Self::ClientCount { .. } => "client_count",
            Self::GameStarted => "game_started",
            Self::GameStateSync(_) => "game_state_sync",
            Self::GarbageReceived { .. } => "garbage_received",
            Self::GameOver { .. } => "game_over",
            Self::ChatMessage { .. } => "chat_message",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Packet {
    pub header: PacketHeader,
    pub payload: PacketType,
}

#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
    #[error("bad protocol magic or version")]
    InvalidHeader,
}

impl From<PacketType> for Packet {
    fn from(payload: PacketType) -> Self {
        Self::new(payload)
    }
}

impl Packet {
    pub fn new(payload: PacketType) -> Self {
        Self {
            header: PacketHeader::default(),
            payload,
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, PacketError> {
        rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(PacketError::Serialize)
    }

    /// Decodes and validates a frame body. The bytes are copied into an
    /// aligned buffer first, since frames arrive at arbitrary offsets.
    pub fn deserialize(data: &[u8]) -> Result<Self, PacketError> {
        let mut aligned = AlignedVec::<16>::with_capacity(data.len());
        aligned.extend_from_slice(data);

        let packet = rkyv::from_bytes::<Self, rancor::Error>(&aligned)
            .map_err(PacketError::Deserialize)?;
        if !packet.header.is_valid() {
            return Err(PacketError::InvalidHeader);
        }
        Ok(packet)
    }
}
