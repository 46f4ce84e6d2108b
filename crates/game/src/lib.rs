pub mod board;
pub mod net;
pub mod room;
pub mod simulation;
pub mod state;
pub mod sync;

pub use board::{BOARD_HEIGHT, BOARD_WIDTH, Block, BlockColor, Board, MatchSet, Position};
pub use net::{
    DEFAULT_PORT, FrameError, GameAction, NetworkStats, Packet, PacketError, PacketHeader,
    PacketLossSimulation, PacketReader, PacketType, write_packet,
};
pub use room::{ConnectionId, Outgoing, RoomInfo, RoomRegistry};
pub use simulation::{
    InputOutcome, LocalSimulated, MatchClock, PlayerInput, SimulationConfig, TickReport,
};
pub use state::{
    CascadeReport, Cursor, Direction, GameState, MirroredSnapshot, PlayerSlot, RoomState, Winner,
};
pub use sync::{MatchSession, SessionEvent, generate_room_code};
