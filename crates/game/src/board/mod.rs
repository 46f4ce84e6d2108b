mod block;
mod grid;
mod matching;

pub use block::{ArchivedBlock, ArchivedBlockColor, Block, BlockColor};
pub use grid::{ArchivedBoard, BOARD_HEIGHT, BOARD_WIDTH, Board, Position, Row};
pub use matching::{MIN_RUN, MatchSet};
