use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::config::SimulationConfig;
use crate::state::{CascadeReport, GameState};

/// Milliseconds since the local match started.
#[derive(Debug, Clone, Copy)]
pub struct MatchClock {
    started: Instant,
}

impl Default for MatchClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchClock {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub rose: bool,
    pub cascade: CascadeReport,
    pub board_changed: bool,
    pub garbage: Vec<u32>,
    pub game_over: bool,
}

/// The half of the match this client simulates. Owns the engine state, the
/// randomness behind rises and garbage, and the rise cadence.
#[derive(Debug, Clone)]
pub struct LocalSimulated {
    pub(super) state: GameState,
    pub(super) config: SimulationConfig,
    pub(super) rng: StdRng,
}

impl LocalSimulated {
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_seed(config: SimulationConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: SimulationConfig, rng: StdRng) -> Self {
        Self {
            state: GameState::new(),
            config,
            rng,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    /// Throws away the previous game and seeds a fresh board.
    pub fn start(&mut self, now_ms: u64) {
        let mut state = GameState::new();
        state.init_board(&self.config, &mut self.rng);
        state.is_playing = true;
        state.last_rise_time = now_ms;
        self.state = state;
    }

    /// Swaps in a prepared position, keeping config and randomness.
    #[doc(hidden)]
    pub fn load_state(&mut self, state: GameState) {
        self.state = state;
    }

    pub fn stop(&mut self) {
        self.state.is_playing = false;
    }

    /// Takes over board and score from a relay catch-up snapshot.
    pub fn adopt_snapshot(&mut self, snapshot: &GameState) {
        self.state.board = snapshot.board.clone();
        self.state.score = snapshot.score;
    }

    /// One step of the local loop: scheduled rise, cascade, game-over check.
    pub fn tick(&mut self, now_ms: u64) -> TickReport {
        if !self.state.is_playing {
            return TickReport::default();
        }

        let mut report = TickReport::default();

        if now_ms.saturating_sub(self.state.last_rise_time) > self.config.rise_interval_ms {
            self.state.rise_blocks(&self.config, &mut self.rng);
            self.state.last_rise_time = now_ms;
            report.rose = true;
        }

        report.cascade = self.state.resolve_cascade();
        report.garbage = report.cascade.garbage().collect();
        report.board_changed = report.rose || report.cascade.changed();

        if self.state.is_game_over() {
            log::debug!("board topped out at {}ms", now_ms);
            self.state.is_playing = false;
            report.game_over = true;
        }

        report
    }

    /// Applies garbage lines sent by the opponent. The next tick decides
    /// whether they topped the board out.
    pub fn receive_garbage(&mut self, lines: u32) -> bool {
        if !self.state.is_playing || lines == 0 {
            return false;
        }
        self.state
            .inject_garbage(lines, &self.config, &mut self.rng);
        true
    }
}
