mod frame;
mod protocol;
mod stats;

pub use frame::{FrameError, PacketReader, read_frame, write_packet};
pub use protocol::{
    ArchivedGameAction, ArchivedPacket, ArchivedPacketType, DEFAULT_PORT, GameAction,
    MAX_PACKET_SIZE, PROTOCOL_MAGIC, PROTOCOL_VERSION, Packet, PacketError, PacketHeader,
    PacketType,
};
pub use stats::{NetworkStats, PacketLossSimulation};
