use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use duel::{BOARD_HEIGHT, BOARD_WIDTH, Block, BlockColor, GameState};

const CELL: &str = "██";
const GARBAGE_CELL: &str = "▓▓";
const EMPTY_CELL: &str = " ·";

pub fn block_color(color: BlockColor) -> Color {
    match color {
        BlockColor::Red => Color::Red,
        BlockColor::Blue => Color::Blue,
        BlockColor::Green => Color::Green,
        BlockColor::Yellow => Color::Yellow,
        BlockColor::Purple => Color::Magenta,
        BlockColor::Garbage => Color::DarkGray,
    }
}

fn cell_span(block: Option<Block>, under_cursor: bool) -> Span<'static> {
    let (text, mut style) = match block {
        Some(block) if block.is_garbage => (GARBAGE_CELL, Style::default().fg(Color::Gray)),
        Some(block) => (CELL, Style::default().fg(block_color(block.color))),
        None => (EMPTY_CELL, Style::default().fg(Color::DarkGray)),
    };
    if under_cursor {
        style = style.bg(Color::White).add_modifier(Modifier::BOLD);
        if block.is_none() {
            style = style.fg(Color::Black);
        }
    }
    Span::styled(text, style)
}

/// One line per board row, with the two-cell cursor highlighted.
pub fn board_lines(state: &GameState) -> Vec<Line<'static>> {
    let cursor = state.cursor;
    (0..BOARD_HEIGHT)
        .map(|y| {
            let spans: Vec<Span> = (0..BOARD_WIDTH)
                .map(|x| {
                    let under_cursor = y == cursor.y as usize
                        && (x == cursor.x as usize || x == cursor.x as usize + 1);
                    cell_span(state.board.get(x as i32, y as i32), under_cursor)
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}
