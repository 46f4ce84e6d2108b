use serde::{Deserialize, Serialize};

use super::tick::LocalSimulated;
use crate::state::{CascadeReport, Cursor, Direction};

/// Local player intent, applied immediately and outside the tick boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerInput {
    Move(Direction),
    Swap,
    Rise,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    /// Off-grid or not playing; nothing to send.
    Rejected,
    CursorMoved(Cursor),
    BoardChanged {
        cascade: CascadeReport,
        game_over: bool,
    },
}

impl InputOutcome {
    pub fn garbage(&self) -> Vec<u32> {
        match self {
            Self::BoardChanged { cascade, .. } => cascade.garbage().collect(),
            _ => Vec::new(),
        }
    }
}

impl LocalSimulated {
    pub fn apply_input(&mut self, input: PlayerInput, now_ms: u64) -> InputOutcome {
        if !self.state.is_playing {
            return InputOutcome::Rejected;
        }

        match input {
            PlayerInput::Move(direction) => {
                if self.state.move_cursor(direction) {
                    InputOutcome::CursorMoved(self.state.cursor)
                } else {
                    InputOutcome::Rejected
                }
            }
            PlayerInput::Swap => {
                if !self.state.swap_at_cursor() {
                    return InputOutcome::Rejected;
                }
                self.settle()
            }
            PlayerInput::Rise => {
                self.state.rise_blocks(&self.config, &mut self.rng);
                self.state.last_rise_time = now_ms;
                self.settle()
            }
        }
    }

    fn settle(&mut self) -> InputOutcome {
        let cascade = self.state.resolve_cascade();
        let game_over = self.state.is_game_over();
        if game_over {
            self.state.is_playing = false;
        }
        InputOutcome::BoardChanged { cascade, game_over }
    }
}
