mod board;

use std::collections::VecDeque;
use std::io;

use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::{Frame, Terminal};

use duel::{BOARD_HEIGHT, BOARD_WIDTH, GameState, MatchSession, SessionEvent, Winner};

use crate::game::{Frontend, outcome_text};

const MAX_MESSAGES: usize = 6;

pub struct TerminalView {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    messages: VecDeque<String>,
    draft: Option<String>,
    restored: bool,
}

impl TerminalView {
    pub fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            messages: VecDeque::with_capacity(MAX_MESSAGES),
            draft: None,
            restored: false,
        })
    }

    fn push_message(&mut self, message: String) {
        if self.messages.len() == MAX_MESSAGES {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    pub fn restore(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        terminal::disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            cursor::Show
        )?;
        Ok(())
    }
}

impl Drop for TerminalView {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

impl Frontend for TerminalView {
    fn on_event(&mut self, session: &MatchSession, event: &SessionEvent) {
        let message = match event {
            SessionEvent::Joined(slot) => format!("Joined as player {}", slot.number()),
            SessionEvent::Denied(reason) => format!("Join denied: {}", reason),
            SessionEvent::ClientCount(2) => "Opponent here, press Enter to start".to_string(),
            SessionEvent::ClientCount(count) => format!("{} player(s) in room", count),
            SessionEvent::Started => "Game started".to_string(),
            SessionEvent::Resynced => return,
            SessionEvent::GarbageIn(lines) => format!("Incoming garbage: {} line(s)", lines),
            SessionEvent::Finished(winner) => {
                format!("Game over: {}", outcome_text(session, *winner))
            }
            SessionEvent::Chat { from, text } if Some(*from) == session.client_id() => {
                format!("P{} (you): {}", from.number(), text)
            }
            SessionEvent::Chat { from, text } => format!("P{}: {}", from.number(), text),
        };
        self.push_message(message);
    }

    fn draw(&mut self, session: &MatchSession) -> io::Result<()> {
        let messages = &self.messages;
        let draft = self.draft.as_deref();
        self.terminal
            .draw(|frame| render(frame, session, messages, draft))?;
        Ok(())
    }

    fn compose(&mut self, draft: Option<&str>) {
        self.draft = draft.map(str::to_string);
    }
}

fn render(
    frame: &mut Frame,
    session: &MatchSession,
    messages: &VecDeque<String>,
    draft: Option<&str>,
) {
    let board_height = BOARD_HEIGHT as u16 + 4;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(board_height),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    render_status(frame, chunks[0], session);

    let board_width = BOARD_WIDTH as u16 * 2 + 2;
    let boards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(board_width + 4),
            Constraint::Length(board_width + 4),
            Constraint::Min(0),
        ])
        .split(chunks[1]);

    let you = session
        .client_id()
        .map(|slot| format!(" You (P{}) ", slot.number()))
        .unwrap_or_else(|| " You ".to_string());
    let opponent = session
        .opponent()
        .map(|slot| format!(" Opponent (P{}) ", slot.number()))
        .unwrap_or_else(|| " Opponent ".to_string());

    render_board(frame, boards[0], &you, session.local().state(), Color::Cyan);
    render_board(frame, boards[1], &opponent, session.mirror(), Color::Magenta);
    render_messages(frame, chunks[2], messages);
    match draft {
        Some(draft) => render_prompt(frame, chunks[3], draft),
        None => render_help(frame, chunks[3]),
    }
}

fn render_status(frame: &mut Frame, area: Rect, session: &MatchSession) {
    let block = Block::default()
        .title(format!(" Duel - Room {} ", session.room()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let status = if session.is_playing() {
        Span::styled("playing", Style::default().fg(Color::Green))
    } else if session.winner() != Winner::None {
        Span::styled(
            outcome_text(session, session.winner()),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    } else if session.client_id().is_none() {
        Span::styled("joining...", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled("waiting", Style::default().fg(Color::Yellow))
    };

    let line = Line::from(vec![
        Span::styled("Players: ", Style::default().fg(Color::Gray)),
        Span::raw(format!("{}/2  |  ", session.connected())),
        status,
    ]);
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_board(frame: &mut Frame, area: Rect, title: &str, state: &GameState, accent: Color) {
    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent));

    let mut lines = board::board_lines(state);
    lines.push(Line::raw(""));
    lines.push(Line::from(vec![
        Span::styled("Score ", Style::default().fg(Color::Gray)),
        Span::styled(
            state.score.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled("  Combo ", Style::default().fg(Color::Gray)),
        Span::raw(state.combo.to_string()),
    ]));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn render_messages(frame: &mut Frame, area: Rect, messages: &VecDeque<String>) {
    let block = Block::default()
        .title(" Messages ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));

    let lines: Vec<Line> = messages.iter().map(|m| Line::raw(m.as_str())).collect();
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" Controls ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let text = Paragraph::new(
        "Arrows move  |  Space swap  |  R rise  |  Enter start  |  T chat  |  Q quit",
    )
        .block(block)
        .style(
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        );

    frame.render_widget(text, area);
}

fn render_prompt(frame: &mut Frame, area: Rect, draft: &str) {
    let block = Block::default()
        .title(" Say (Enter send, Esc cancel) ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let line = Line::from(vec![
        Span::raw(draft),
        Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
    ]);
    frame.render_widget(Paragraph::new(line).block(block), area);
}
