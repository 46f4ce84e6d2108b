use rand::Rng;
use rkyv::Archive;
use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub enum BlockColor {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Garbage,
}

impl BlockColor {
    /// Colors a rising row or a fresh board may contain.
    pub const PALETTE: [Self; 5] = [Self::Red, Self::Blue, Self::Green, Self::Yellow, Self::Purple];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::PALETTE[rng.gen_range(0..Self::PALETTE.len())]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Purple => "purple",
            Self::Garbage => "garbage",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, rkyv::Serialize, rkyv::Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct Block {
    pub color: BlockColor,
    pub is_garbage: bool,
    pub matched: bool,
}

impl Block {
    pub fn colored(color: BlockColor) -> Self {
        Self {
            color,
            is_garbage: color == BlockColor::Garbage,
            matched: false,
        }
    }

    pub fn garbage() -> Self {
        Self::colored(BlockColor::Garbage)
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::colored(BlockColor::random(rng))
    }

    /// The color this block contributes to a run, if any.
    #[inline]
    pub fn match_color(&self) -> Option<BlockColor> {
        if self.is_garbage || self.color == BlockColor::Garbage {
            None
        } else {
            Some(self.color)
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_garbage_never_matches() {
        assert_eq!(Block::garbage().match_color(), None);
        assert!(Block::garbage().is_garbage);
        assert_eq!(Block::colored(BlockColor::Red).match_color(), Some(BlockColor::Red));
    }

    #[test]
    fn test_random_blocks_come_from_palette() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let block = Block::random(&mut rng);
            assert!(!block.is_garbage);
            assert!(BlockColor::PALETTE.contains(&block.color));
        }
    }
}
