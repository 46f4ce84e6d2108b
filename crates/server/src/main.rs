mod config;
mod events;
mod server;
mod tui;

use std::io;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::UnboundedReceiver;

use config::ServerConfig;
use duel::PacketLossSimulation;
use events::ServerEvent;
use server::RelayServer;
use tui::TuiState;

#[derive(Parser)]
#[command(name = "duel-server")]
#[command(about = "Relay server for two-player block duels")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    #[arg(short, long, default_value_t = duel::DEFAULT_PORT)]
    port: u16,

    #[arg(
        short,
        long,
        default_value_t = duel::room::DEFAULT_RESYNC_PROBABILITY,
        help = "Chance of a full room resync after each relayed action (0-1)"
    )]
    resync_probability: f64,

    #[arg(long)]
    headless: bool,

    #[arg(long, help = "Randomly drop relayed game actions")]
    simulate_packet_loss: bool,

    #[arg(long, default_value_t = 0.0, help = "Packet loss percentage (0-100)")]
    loss_percent: f32,

    #[arg(long, help = "Seed for resync and loss decisions")]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let packet_loss = args
        .simulate_packet_loss
        .then(|| PacketLossSimulation::new(args.loss_percent));

    let config = ServerConfig {
        bind_addr: format!("{}:{}", args.bind, args.port),
        resync_probability: args.resync_probability,
        packet_loss,
        seed: args.seed,
    };

    let runtime = Runtime::new()?;
    let mut server = runtime.block_on(RelayServer::bind(config))?;

    if args.headless {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        log::info!("Server started on {}", server.local_addr()?);
        runtime.block_on(async move {
            tokio::select! {
                result = server.run() => result,
                _ = tokio::signal::ctrl_c() => Ok(()),
            }
        })?;
        log::info!("Server shutting down");
    } else {
        let local_addr = server.local_addr()?;
        let events = server.take_events();
        let stats = server.stats();
        runtime.spawn(server.run());
        run_with_tui(local_addr, events, stats)?;
        runtime.shutdown_timeout(Duration::from_millis(200));
    }

    Ok(())
}

fn run_with_tui(
    local_addr: std::net::SocketAddr,
    mut events: Option<UnboundedReceiver<ServerEvent>>,
    stats: tokio::sync::watch::Receiver<server::ServerStats>,
) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut tui_state = TuiState::new();
    tui_state.log_info(format!("Server started on {}", local_addr));

    loop {
        if let Some(events) = events.as_mut() {
            while let Ok(event) = events.try_recv() {
                log_event(&mut tui_state, event);
            }
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::PageUp => tui_state.scroll_up(),
                        KeyCode::PageDown => tui_state.scroll_down(),
                        KeyCode::End => tui_state.scroll_to_bottom(),
                        _ => {}
                    }
                }
            }
        }

        let stats = stats.borrow().clone();
        terminal.draw(|frame| {
            tui::render(frame, &tui_state, &stats);
        })?;
    }

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;

    Ok(())
}

fn log_event(tui_state: &mut TuiState, event: ServerEvent) {
    match event {
        ServerEvent::ClientConnected { connection, addr } => {
            tui_state.log_info(format!("Connection {} from {}", connection, addr));
        }
        ServerEvent::ClientDisconnected { connection, reason } => {
            tui_state.log_info(format!("Connection {} {}", connection, reason.as_str()));
        }
        ServerEvent::PlayerJoined {
            connection,
            room,
            slot,
        } => {
            tui_state.log_info(format!(
                "Connection {} joined {} as player {}",
                connection,
                room,
                slot.number()
            ));
        }
        ServerEvent::JoinDenied { connection, room } => {
            tui_state.log_warn(format!("Connection {} denied: {} is full", connection, room));
        }
        ServerEvent::GameStarted { room } => {
            tui_state.log_info(format!("Game started in {}", room));
        }
        ServerEvent::GameFinished { room, winner } => {
            tui_state.log_info(format!("Game over in {}: {}", room, winner.as_str()));
        }
        ServerEvent::RoomClosed { room } => {
            tui_state.log_info(format!("Room {} closed", room));
        }
        ServerEvent::Error { message } => {
            tui_state.log_error(message);
        }
    }
}
