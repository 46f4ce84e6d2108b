mod cursor;
mod game;
mod mirror;
mod room;

pub use cursor::{ArchivedCursor, Cursor, Direction};
pub use game::{
    ArchivedGameState, CascadeReport, ClearOutcome, GARBAGE_COMBO_THRESHOLD, GameState,
    POINTS_PER_BLOCK, garbage_lines_for_combo,
};
pub use mirror::MirroredSnapshot;
pub use room::{ArchivedPlayerSlot, ArchivedRoomState, ArchivedWinner, PlayerSlot, RoomState, Winner};
