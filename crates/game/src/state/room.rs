use rkyv::Archive;
use serde::{Deserialize, Serialize};

use super::game::GameState;

/// Per-room identity; players are numbered 1 and 2 on the wire.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub enum PlayerSlot {
    One,
    Two,
}

impl PlayerSlot {
    pub const ALL: [Self; 2] = [Self::One, Self::Two];

    pub fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            _ => None,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    /// The outcome in which this slot wins.
    pub fn as_winner(self) -> Winner {
        match self {
            Self::One => Winner::Player1,
            Self::Two => Winner::Player2,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub enum Winner {
    #[default]
    None,
    Player1,
    Player2,
    Disconnect,
}

impl Winner {
    pub fn slot(self) -> Option<PlayerSlot> {
        match self {
            Self::Player1 => Some(PlayerSlot::One),
            Self::Player2 => Some(PlayerSlot::Two),
            Self::None | Self::Disconnect => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Player1 => "player1",
            Self::Player2 => "player2",
            Self::Disconnect => "disconnect",
        }
    }
}

/// The relay's passive copy of a room. It is only ever patched from relayed
/// messages, never simulated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Archive, rkyv::Serialize, rkyv::Deserialize)]
#[rkyv(derive(Debug))]
pub struct RoomState {
    pub player1: GameState,
    pub player2: GameState,
    pub game_started: bool,
    pub winner: Winner,
}

impl RoomState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player(&self, slot: PlayerSlot) -> &GameState {
        match slot {
            PlayerSlot::One => &self.player1,
            PlayerSlot::Two => &self.player2,
        }
    }

    pub fn player_mut(&mut self, slot: PlayerSlot) -> &mut GameState {
        match slot {
            PlayerSlot::One => &mut self.player1,
            PlayerSlot::Two => &mut self.player2,
        }
    }

    /// Fresh halves for a new game.
    pub fn reset_for_start(&mut self) {
        self.player1 = GameState::new();
        self.player2 = GameState::new();
        self.player1.is_playing = true;
        self.player2.is_playing = true;
        self.game_started = true;
        self.winner = Winner::None;
    }

    pub fn finish(&mut self, winner: Winner) {
        self.winner = winner;
        self.game_started = false;
        self.player1.is_playing = false;
        self.player2.is_playing = false;
    }
}
