use rand::Rng;
use rkyv::Archive;

use super::cursor::{Cursor, Direction};
use crate::board::{BOARD_HEIGHT, BOARD_WIDTH, Block, Board, MatchSet};
use crate::simulation::SimulationConfig;

pub const POINTS_PER_BLOCK: u32 = 10;
pub const GARBAGE_COMBO_THRESHOLD: u32 = 3;

/// Lines sent to the opponent once a combo reaches `combo`.
pub fn garbage_lines_for_combo(combo: u32) -> Option<u32> {
    (combo >= GARBAGE_COMBO_THRESHOLD).then(|| ((combo - 2) / 2).max(1))
}

/// Result of one `remove_matches` step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClearOutcome {
    pub cleared: u32,
    pub points: u32,
    pub combo: u32,
    pub garbage_lines: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub moved: bool,
    pub steps: Vec<ClearOutcome>,
    pub points: u32,
}

impl CascadeReport {
    pub fn changed(&self) -> bool {
        self.moved || !self.steps.is_empty()
    }

    pub fn cleared(&self) -> u32 {
        self.steps.iter().map(|s| s.cleared).sum()
    }

    pub fn garbage(&self) -> impl Iterator<Item = u32> + '_ {
        self.steps.iter().filter_map(|s| s.garbage_lines)
    }
}

/// One player's half of a match.
#[derive(Debug, Clone, PartialEq, Eq, Archive, rkyv::Serialize, rkyv::Deserialize)]
#[rkyv(derive(Debug))]
pub struct GameState {
    pub board: Board,
    pub cursor: Cursor,
    pub score: u32,
    pub combo: u32,
    pub is_playing: bool,
    /// Match clock, in milliseconds, of the most recent rise.
    pub last_rise_time: u64,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            cursor: Cursor::default(),
            score: 0,
            combo: 0,
            is_playing: false,
            last_rise_time: 0,
        }
    }

    /// Seeds the bottom rows of a fresh board.
    pub fn init_board<R: Rng + ?Sized>(&mut self, config: &SimulationConfig, rng: &mut R) {
        let first_row = BOARD_HEIGHT.saturating_sub(config.initial_rows);
        for y in first_row..BOARD_HEIGHT {
            for x in 0..BOARD_WIDTH {
                if rng.gen_bool(config.initial_fill_probability) {
                    self.board.set(x as i32, y as i32, Some(Block::random(rng)));
                }
            }
        }
    }

    pub fn move_cursor(&mut self, direction: Direction) -> bool {
        self.cursor.step(direction)
    }

    pub fn swap_at_cursor(&mut self) -> bool {
        let (x, y) = (self.cursor.x as i32, self.cursor.y as i32);
        self.board.swap(x, y, x + 1, y)
    }

    /// Clears `matches` and does the combo and score bookkeeping. An empty
    /// set resets the combo.
    pub fn remove_matches(&mut self, matches: &MatchSet) -> ClearOutcome {
        if matches.is_empty() {
            self.combo = 0;
            return ClearOutcome::default();
        }

        let multiplier = self.combo + 1;
        let mut cleared = 0;
        for pos in matches {
            if self.board.at(*pos).is_some() {
                self.board.set(pos.x as i32, pos.y as i32, None);
                cleared += 1;
            }
        }

        let points = cleared * POINTS_PER_BLOCK * multiplier;
        self.score += points;
        self.combo += 1;

        ClearOutcome {
            cleared,
            points,
            combo: self.combo,
            garbage_lines: garbage_lines_for_combo(self.combo),
        }
    }

    /// Gravity to a fixed point, then clear matches, until the board is
    /// stable. A resolution that clears nothing resets the combo.
    pub fn resolve_cascade(&mut self) -> CascadeReport {
        let mut report = CascadeReport::default();

        loop {
            while self.board.apply_gravity() {
                report.moved = true;
            }

            let matches = self.board.find_matches();
            if matches.is_empty() {
                break;
            }

            let outcome = self.remove_matches(&matches);
            log::trace!(
                "cleared {} blocks at combo {} for {} points",
                outcome.cleared,
                outcome.combo,
                outcome.points
            );
            report.points += outcome.points;
            report.steps.push(outcome);
        }

        if report.steps.is_empty() {
            self.remove_matches(&MatchSet::new());
        }

        report
    }

    /// Pushes the board up one row and fills the bottom with colored blocks.
    pub fn rise_blocks<R: Rng + ?Sized>(&mut self, config: &SimulationConfig, rng: &mut R) {
        self.board.shift_up();
        self.board
            .fill_bottom_row(rng, config.rise_fill_probability, |rng| Block::random(rng));

        if self.cursor.y >= Cursor::MAX_Y {
            self.cursor.y = Cursor::MAX_Y - 1;
        }
    }

    /// One rise per line, with the new bottom row mostly overwritten by garbage.
    pub fn inject_garbage<R: Rng + ?Sized>(
        &mut self,
        lines: u32,
        config: &SimulationConfig,
        rng: &mut R,
    ) {
        for _ in 0..lines {
            self.rise_blocks(config, rng);
            for x in 0..BOARD_WIDTH as i32 {
                if rng.gen_bool(config.garbage_fill_probability) {
                    self.board.set(x, (BOARD_HEIGHT - 1) as i32, Some(Block::garbage()));
                }
            }
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.board.is_game_over()
    }
}
