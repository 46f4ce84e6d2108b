use std::collections::BTreeSet;

use super::block::BlockColor;
use super::grid::{BOARD_HEIGHT, BOARD_WIDTH, Board, Position};

pub const MIN_RUN: usize = 3;

/// Unique matched cells; horizontal and vertical runs sharing a cell count once.
pub type MatchSet = BTreeSet<Position>;

impl Board {
    /// Collects every cell that belongs to a horizontal or vertical run of at
    /// least three same-colored, non-garbage blocks.
    pub fn find_matches(&self) -> MatchSet {
        let mut matches = MatchSet::new();

        for y in 0..BOARD_HEIGHT {
            let line: Vec<Position> = (0..BOARD_WIDTH).map(|x| Position::new(x, y)).collect();
            self.collect_runs(&line, &mut matches);
        }

        for x in 0..BOARD_WIDTH {
            let line: Vec<Position> = (0..BOARD_HEIGHT).map(|y| Position::new(x, y)).collect();
            self.collect_runs(&line, &mut matches);
        }

        matches
    }

    fn collect_runs(&self, line: &[Position], matches: &mut MatchSet) {
        let mut run_start = 0;
        let mut run_color: Option<BlockColor> = None;

        for (i, &pos) in line.iter().enumerate() {
            let color = self.at(pos).and_then(|b| b.match_color());
            if color.is_some() && color == run_color {
                continue;
            }
            if run_color.is_some() && i - run_start >= MIN_RUN {
                matches.extend(&line[run_start..i]);
            }
            run_start = i;
            run_color = color;
        }

        if run_color.is_some() && line.len() - run_start >= MIN_RUN {
            matches.extend(&line[run_start..]);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::board::Block;

    fn put(board: &mut Board, x: i32, y: i32, color: BlockColor) {
        board.set(x, y, Some(Block::colored(color)));
    }

    #[test]
    fn test_horizontal_run_of_three() {
        let mut board = Board::new();
        put(&mut board, 1, 11, BlockColor::Blue);
        put(&mut board, 2, 11, BlockColor::Blue);
        put(&mut board, 3, 11, BlockColor::Blue);
        put(&mut board, 4, 11, BlockColor::Red);

        let matches = board.find_matches();
        let expected: MatchSet = [1, 2, 3].into_iter().map(|x| Position::new(x, 11)).collect();
        assert_eq!(matches, expected);
    }

    #[test]
    fn test_run_reaching_the_edge_is_reported() {
        let mut board = Board::new();
        for x in 2..6 {
            put(&mut board, x, 4, BlockColor::Green);
        }
        for y in 9..12 {
            put(&mut board, 0, y, BlockColor::Purple);
        }
        let matches = board.find_matches();
        assert_eq!(matches.len(), 7);
        assert!(matches.contains(&Position::new(5, 4)));
        assert!(matches.contains(&Position::new(0, 11)));
    }

    #[test]
    fn test_crossing_runs_are_merged() {
        let mut board = Board::new();
        for x in 0..3 {
            put(&mut board, x, 11, BlockColor::Yellow);
        }
        put(&mut board, 1, 10, BlockColor::Yellow);
        put(&mut board, 1, 9, BlockColor::Yellow);

        assert_eq!(board.find_matches().len(), 5);
    }

    #[test]
    fn test_garbage_and_gaps_break_runs() {
        let mut board = Board::new();
        put(&mut board, 0, 11, BlockColor::Red);
        put(&mut board, 1, 11, BlockColor::Red);
        board.set(2, 11, Some(Block::garbage()));
        put(&mut board, 3, 11, BlockColor::Red);
        put(&mut board, 4, 11, BlockColor::Red);

        put(&mut board, 0, 5, BlockColor::Red);
        put(&mut board, 1, 5, BlockColor::Red);
        put(&mut board, 3, 5, BlockColor::Red);

        for x in 0..3 {
            board.set(x, 2, Some(Block::garbage()));
        }

        assert!(board.find_matches().is_empty());
    }

    #[test]
    fn test_matches_never_contain_garbage_empty_or_short_runs() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..64 {
            let mut board = Board::new();
            for y in 0..BOARD_HEIGHT as i32 {
                for x in 0..BOARD_WIDTH as i32 {
                    if rng.gen_bool(0.8) {
                        let block = if rng.gen_bool(0.15) {
                            Block::garbage()
                        } else {
                            Block::colored(BlockColor::PALETTE[rng.gen_range(0..3)])
                        };
                        board.set(x, y, Some(block));
                    }
                }
            }

            for pos in board.find_matches() {
                let block = board.at(pos).expect("matched cell must hold a block");
                assert!(!block.is_garbage);
                let color = block.color;
                let same = |x: i32, y: i32| board.get(x, y).and_then(|b| b.match_color()) == Some(color);

                let (x, y) = (pos.x as i32, pos.y as i32);
                let horizontal = (-2..=0).any(|s| (0..3).all(|k| same(x + s + k, y)));
                let vertical = (-2..=0).any(|s| (0..3).all(|k| same(x, y + s + k)));
                assert!(horizontal || vertical, "{pos:?} is not part of a run of three");
            }
        }
    }
}
