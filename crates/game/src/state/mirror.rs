use std::ops::Deref;

use super::cursor::Cursor;
use super::game::GameState;
use crate::board::Board;

/// The opponent's half as seen by this client. It can be read freely but is
/// only ever overwritten from received snapshots; there is no way to run the
/// engine on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirroredSnapshot {
    state: GameState,
}

impl MirroredSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn replace(&mut self, state: GameState) {
        self.state = state;
    }

    pub fn overwrite_board(&mut self, board: Board, score: u32, combo: Option<u32>) {
        self.state.board = board;
        self.state.score = score;
        if let Some(combo) = combo {
            self.state.combo = combo;
        }
    }

    pub fn overwrite_cursor(&mut self, cursor: Cursor) {
        self.state.cursor = cursor;
    }

    pub fn freeze(&mut self) {
        self.state.is_playing = false;
    }
}

impl Deref for MirroredSnapshot {
    type Target = GameState;

    fn deref(&self) -> &GameState {
        &self.state
    }
}
