use rand::Rng;
use rkyv::Archive;

use super::block::Block;

pub const BOARD_WIDTH: usize = 6;
pub const BOARD_HEIGHT: usize = 12;

pub type Row = [Option<Block>; BOARD_WIDTH];

/// Cell coordinate; `y = 0` is the top row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// The 6x12 playfield. Row 0 is the game-over line, the last row is where
/// rising rows enter.
#[derive(Debug, Clone, PartialEq, Eq, Archive, rkyv::Serialize, rkyv::Deserialize)]
#[rkyv(derive(Debug))]
pub struct Board {
    cells: [Row; BOARD_HEIGHT],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [[None; BOARD_WIDTH]; BOARD_HEIGHT],
        }
    }

    pub fn from_rows(cells: [Row; BOARD_HEIGHT]) -> Self {
        Self { cells }
    }

    #[inline]
    pub fn width(&self) -> usize {
        BOARD_WIDTH
    }

    #[inline]
    pub fn height(&self) -> usize {
        BOARD_HEIGHT
    }

    #[inline]
    fn index(x: i32, y: i32) -> Option<(usize, usize)> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        (x < BOARD_WIDTH && y < BOARD_HEIGHT).then_some((x, y))
    }

    /// Out-of-range reads are empty.
    pub fn get(&self, x: i32, y: i32) -> Option<Block> {
        Self::index(x, y).and_then(|(x, y)| self.cells[y][x])
    }

    /// Out-of-range writes are ignored.
    pub fn set(&mut self, x: i32, y: i32, block: Option<Block>) {
        if let Some((x, y)) = Self::index(x, y) {
            self.cells[y][x] = block;
        }
    }

    pub fn at(&self, pos: Position) -> Option<Block> {
        self.cells.get(pos.y).and_then(|row| row.get(pos.x)).copied().flatten()
    }

    pub fn rows(&self) -> &[Row; BOARD_HEIGHT] {
        &self.cells
    }

    pub fn row(&self, y: usize) -> Option<&Row> {
        self.cells.get(y)
    }

    /// Swaps two horizontally adjacent cells, empties included. Does not
    /// look for matches.
    pub fn swap(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) -> bool {
        if y1 != y2 || x2 != x1 + 1 {
            return false;
        }
        let (Some((a, y)), Some((b, _))) = (Self::index(x1, y1), Self::index(x2, y2)) else {
            return false;
        };
        self.cells[y].swap(a, b);
        true
    }

    /// Drops every block with an empty cell below it onto the lowest free
    /// slot of its column. Rows are scanned bottom-up, so one call settles
    /// the board; callers still loop until it reports no movement.
    pub fn apply_gravity(&mut self) -> bool {
        let mut moved = false;
        for x in 0..BOARD_WIDTH {
            for y in (0..BOARD_HEIGHT - 1).rev() {
                if self.cells[y][x].is_none() || self.cells[y + 1][x].is_some() {
                    continue;
                }
                let mut target = y + 1;
                while target + 1 < BOARD_HEIGHT && self.cells[target + 1][x].is_none() {
                    target += 1;
                }
                self.cells[target][x] = self.cells[y][x].take();
                moved = true;
            }
        }
        moved
    }

    /// True when no block has an empty cell directly beneath it.
    pub fn is_settled(&self) -> bool {
        (0..BOARD_HEIGHT - 1).all(|y| {
            (0..BOARD_WIDTH).all(|x| self.cells[y][x].is_none() || self.cells[y + 1][x].is_some())
        })
    }

    /// Moves every row up by one and returns the row pushed off the top.
    /// The bottom row is left empty.
    pub fn shift_up(&mut self) -> Row {
        let discarded = self.cells[0];
        self.cells.rotate_left(1);
        self.cells[BOARD_HEIGHT - 1] = [None; BOARD_WIDTH];
        discarded
    }

    /// Fills the bottom row, each cell independently with probability `fill`.
    pub fn fill_bottom_row<R, F>(&mut self, rng: &mut R, fill: f64, mut make: F)
    where
        R: Rng + ?Sized,
        F: FnMut(&mut R) -> Block,
    {
        for x in 0..BOARD_WIDTH {
            self.cells[BOARD_HEIGHT - 1][x] = if rng.gen_bool(fill) {
                Some(make(rng))
            } else {
                None
            };
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.cells[0].iter().any(Option::is_some)
    }

    pub fn block_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    pub fn clear(&mut self) {
        self.cells = [[None; BOARD_WIDTH]; BOARD_HEIGHT];
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::board::BlockColor;

    fn red() -> Option<Block> {
        Some(Block::colored(BlockColor::Red))
    }

    fn random_board(seed: u64) -> Board {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut board = Board::new();
        for y in 0..BOARD_HEIGHT {
            for x in 0..BOARD_WIDTH {
                if rng.gen_bool(0.45) {
                    let block = if rng.gen_bool(0.2) {
                        Block::garbage()
                    } else {
                        Block::random(&mut rng)
                    };
                    board.set(x as i32, y as i32, Some(block));
                }
            }
        }
        board
    }

    #[test]
    fn test_out_of_range_access_is_harmless() {
        let mut board = Board::new();
        board.set(-1, 0, red());
        board.set(BOARD_WIDTH as i32, 0, red());
        board.set(0, BOARD_HEIGHT as i32, red());
        assert_eq!(board.block_count(), 0);
        assert_eq!(board.get(-1, -1), None);
        assert_eq!(board.get(99, 3), None);
    }

    #[test]
    fn test_swap_requires_adjacent_cells_on_one_row() {
        let mut board = Board::new();
        board.set(0, 5, red());

        assert!(!board.swap(0, 5, 2, 5));
        assert!(!board.swap(0, 5, 1, 6));
        assert!(!board.swap(5, 5, 6, 5));
        assert!(!board.swap(-1, 5, 0, 5));

        assert!(board.swap(0, 5, 1, 5));
        assert_eq!(board.get(0, 5), None);
        assert_eq!(board.get(1, 5), red());
    }

    #[test]
    fn test_gravity_drops_to_lowest_slot() {
        let mut board = Board::new();
        board.set(2, 0, red());
        board.set(2, 3, Some(Block::garbage()));

        assert!(board.apply_gravity());
        assert_eq!(board.get(2, 11), Some(Block::garbage()));
        assert_eq!(board.get(2, 10), red());
        assert_eq!(board.block_count(), 2);
    }

    #[test]
    fn test_gravity_reaches_fixed_point_and_is_idempotent() {
        for seed in 0..32 {
            let mut board = random_board(seed);
            let count = board.block_count();
            while board.apply_gravity() {}
            assert!(board.is_settled(), "seed {seed} left floating blocks");
            assert_eq!(board.block_count(), count);

            let settled = board.clone();
            assert!(!board.apply_gravity());
            assert_eq!(board, settled);
        }
    }

    #[test]
    fn test_shift_up_moves_rows_and_discards_top() {
        let mut board = Board::new();
        board.set(0, 0, red());
        board.set(1, 1, Some(Block::garbage()));
        board.set(4, 11, red());

        let discarded = board.shift_up();
        assert_eq!(discarded[0], red());
        assert_eq!(board.get(1, 0), Some(Block::garbage()));
        assert_eq!(board.get(4, 10), red());
        assert!(board.row(11).is_some_and(|row| row.iter().all(Option::is_none)));
    }

    #[test]
    fn test_game_over_reads_top_row_only() {
        let mut board = Board::new();
        board.set(3, 1, red());
        assert!(!board.is_game_over());
        board.set(3, 0, red());
        assert!(board.is_game_over());
    }
}
