use std::collections::VecDeque;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use duel::Winner;

use crate::server::ServerStats;

const MAX_LOG_LINES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn color(self) -> Color {
        match self {
            LogLevel::Info => Color::White,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Error => Color::Red,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct TuiState {
    logs: VecDeque<LogEntry>,
    /// Lines scrolled back from the newest entry.
    scroll: usize,
}

impl TuiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into());
    }

    pub fn log_warn(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warn, message.into());
    }

    pub fn log_error(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Error, message.into());
    }

    fn push(&mut self, level: LogLevel, message: String) {
        if self.logs.len() == MAX_LOG_LINES {
            self.logs.pop_front();
        }
        self.logs.push_back(LogEntry { level, message });
    }

    pub fn scroll_up(&mut self) {
        self.scroll = (self.scroll + 5).min(self.logs.len().saturating_sub(1));
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_sub(5);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = 0;
    }
}

pub fn render(frame: &mut Frame, state: &TuiState, stats: &ServerStats) {
    let room_rows = (stats.rooms.len().max(1) + 2).min(12) as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Length(room_rows),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], stats);
    render_network(frame, chunks[1], stats);
    render_rooms(frame, chunks[2], stats);
    render_log(frame, chunks[3], state);
    render_help(frame, chunks[4]);
}

fn render_header(frame: &mut Frame, area: Rect, stats: &ServerStats) {
    let title = format!(" Duel Relay - Uptime: {} ", format_duration(stats.uptime_secs));

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let text = format!(
        "Connections: {}  |  Players: {}  |  Rooms: {}",
        stats.connection_count,
        stats.player_count,
        stats.rooms.len()
    );

    let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(paragraph, area);
}

fn render_network(frame: &mut Frame, area: Rect, stats: &ServerStats) {
    let block = Block::default()
        .title(" Network ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let net = &stats.network_stats;
    let loss = match &stats.packet_loss {
        Some(sim) => format!("{:.1}% of relayed actions", sim.loss_percent),
        None => "off".to_string(),
    };
    let lines = vec![
        Line::from(vec![
            Span::styled("Packets: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} sent / {} recv", net.packets_sent, net.packets_received),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Resyncs: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!(
                    "{} sent (p = {:.2})",
                    net.resyncs_sent, stats.resync_probability
                ),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Simulated loss: ", Style::default().fg(Color::Gray)),
            Span::styled(loss, Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled("Dropped: ", Style::default().fg(Color::Gray)),
            Span::styled(
                net.packets_lost.to_string(),
                Style::default().fg(if net.packets_lost > 0 {
                    Color::Red
                } else {
                    Color::White
                }),
            ),
        ]),
    ];

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}

fn render_rooms(frame: &mut Frame, area: Rect, stats: &ServerStats) {
    let block = Block::default()
        .title(" Rooms ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let lines: Vec<Line> = if stats.rooms.is_empty() {
        vec![Line::styled(
            "no rooms",
            Style::default().fg(Color::DarkGray),
        )]
    } else {
        stats
            .rooms
            .iter()
            .map(|room| {
                let status = if room.game_started {
                    Span::styled("playing", Style::default().fg(Color::Green))
                } else if room.winner != Winner::None {
                    Span::styled(
                        format!("over ({})", room.winner.as_str()),
                        Style::default().fg(Color::Magenta),
                    )
                } else {
                    Span::styled("waiting", Style::default().fg(Color::Yellow))
                };
                Line::from(vec![
                    Span::styled(
                        format!("{:<8}", room.key),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(format!(
                        " {}/2  {:>6} - {:<6}  {:>8}  ",
                        room.members,
                        room.scores[0],
                        room.scores[1],
                        format_duration(room.age_secs)
                    )),
                    status,
                ])
            })
            .collect()
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_log(frame: &mut Frame, area: Rect, state: &TuiState) {
    let block = Block::default()
        .title(" Log ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));

    let visible = area.height.saturating_sub(2) as usize;
    let end = state.logs.len().saturating_sub(state.scroll);
    let start = end.saturating_sub(visible);
    let lines: Vec<Line> = state
        .logs
        .range(start..end)
        .map(|entry| {
            Line::styled(
                entry.message.as_str(),
                Style::default().fg(entry.level.color()),
            )
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" Controls ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let text = Paragraph::new("q/ESC quit  |  PgUp/PgDn scroll log  |  End newest")
        .block(block)
        .style(
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        );

    frame.render_widget(text, area);
}

fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}
