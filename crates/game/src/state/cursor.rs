use rkyv::Archive;
use serde::{Deserialize, Serialize};

use crate::board::{BOARD_HEIGHT, BOARD_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Left cell of the swappable pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, rkyv::Serialize, rkyv::Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct Cursor {
    pub x: u8,
    pub y: u8,
}

impl Default for Cursor {
    fn default() -> Self {
        Self { x: 2, y: 8 }
    }
}

impl Cursor {
    pub const MAX_X: u8 = (BOARD_WIDTH - 2) as u8;
    pub const MAX_Y: u8 = (BOARD_HEIGHT - 1) as u8;

    pub fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Moves one cell; refuses to leave the addressable area.
    pub fn step(&mut self, direction: Direction) -> bool {
        match direction {
            Direction::Left if self.x > 0 => self.x -= 1,
            Direction::Right if self.x < Self::MAX_X => self.x += 1,
            Direction::Up if self.y > 0 => self.y -= 1,
            Direction::Down if self.y < Self::MAX_Y => self.y += 1,
            _ => return false,
        }
        true
    }

    pub fn is_valid(&self) -> bool {
        self.x <= Self::MAX_X && self.y <= Self::MAX_Y
    }
}
