mod input;

use std::io;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use duel::{MatchClock, MatchSession, SessionEvent, Winner};

use input::{AutoPlayer, Control, KeyMap};

use crate::net::{ClientConfig, ServerConnection};
use crate::tui::TerminalView;

/// Where session progress ends up: a terminal view or the log.
pub trait Frontend {
    fn on_event(&mut self, session: &MatchSession, event: &SessionEvent);

    fn draw(&mut self, _session: &MatchSession) -> io::Result<()> {
        Ok(())
    }

    /// Shows or hides the chat prompt.
    fn compose(&mut self, _draft: Option<&str>) {}

    /// Headless runs stop after one match.
    fn exit_after_match(&self) -> bool {
        false
    }
}

pub struct LogFrontend;

impl Frontend for LogFrontend {
    fn on_event(&mut self, session: &MatchSession, event: &SessionEvent) {
        match event {
            SessionEvent::Joined(slot) => {
                log::info!("joined room {} as player {}", session.room(), slot.number())
            }
            SessionEvent::Denied(reason) => log::warn!("join denied: {}", reason),
            SessionEvent::ClientCount(count) => log::info!("{} player(s) in room", count),
            SessionEvent::Started => log::info!("game started"),
            SessionEvent::Resynced => log::trace!("opponent resynced"),
            SessionEvent::GarbageIn(lines) => log::info!("received {} garbage line(s)", lines),
            SessionEvent::Finished(winner) => {
                log::info!(
                    "game over: {} (score {})",
                    outcome_text(session, *winner),
                    session.local().state().score
                )
            }
            SessionEvent::Chat { from, text } => {
                log::info!("player {}: {}", from.number(), text)
            }
        }
    }

    fn exit_after_match(&self) -> bool {
        true
    }
}

pub fn outcome_text(session: &MatchSession, winner: Winner) -> &'static str {
    match (winner, winner.slot()) {
        (Winner::Disconnect, _) => "opponent disconnected",
        (_, Some(slot)) if Some(slot) == session.client_id() => "you win",
        (_, Some(_)) => "you lose",
        _ => "no winner",
    }
}

pub async fn run(config: ClientConfig, autoplay: bool) -> Result<()> {
    let connection = ServerConnection::connect(&config.server_addr)
        .await
        .with_context(|| format!("failed to connect to {}", config.server_addr))?;

    let session = match config.seed {
        Some(seed) => MatchSession::with_seed(&config.room, config.simulation.clone(), seed),
        None => MatchSession::new(&config.room, config.simulation.clone()),
    };
    let tick_interval = Duration::from_millis(config.simulation.tick_interval_ms);
    let (controls_tx, controls_rx) = mpsc::unbounded_channel();

    if autoplay {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        spawn_autoplay(
            AutoPlayer::new(rng),
            Duration::from_millis(config.autoplay_interval_ms),
            controls_tx,
        );
        run_session(session, connection, controls_rx, &mut LogFrontend, tick_interval).await
    } else {
        spawn_key_reader(controls_tx);
        let mut view = TerminalView::new()?;
        let result =
            run_session(session, connection, controls_rx, &mut view, tick_interval).await;
        view.restore()?;
        result
    }
}

/// The client's single event loop. Ticks, inbound packets and local controls
/// are handled one at a time, so none of them interleave.
pub async fn run_session<F: Frontend>(
    mut session: MatchSession,
    mut connection: ServerConnection,
    mut controls: mpsc::UnboundedReceiver<Control>,
    frontend: &mut F,
    tick_interval: Duration,
) -> Result<()> {
    let clock = MatchClock::new();
    connection.send(session.join_packet());
    frontend.draw(&session)?;

    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let was_playing = session.is_playing();
        let mut event = None;

        tokio::select! {
            _ = ticker.tick() => {
                connection.send_all(session.tick(clock.now_ms()));
            }
            inbound = connection.recv() => {
                let Some(packet) = inbound else {
                    bail!("lost connection to the server");
                };
                event = session.handle_packet(packet, clock.now_ms());
            }
            control = controls.recv() => match control {
                Some(Control::Input(input)) => {
                    connection.send_all(session.input(input, clock.now_ms()));
                }
                Some(Control::Start) => {
                    if let Some(packet) = session.request_start() {
                        connection.send(packet);
                    }
                }
                Some(Control::ChatDraft(draft)) => frontend.compose(draft.as_deref()),
                Some(Control::Chat(text)) => {
                    frontend.compose(None);
                    let packet = session.chat(text.as_str());
                    if let (Some(packet), Some(me)) = (packet, session.client_id()) {
                        connection.send(packet);
                        event = Some(SessionEvent::Chat { from: me, text });
                    }
                }
                Some(Control::Quit) | None => break,
            },
        }

        // A local top-out ends the game without any inbound message.
        if event.is_none() && was_playing && !session.is_playing() {
            event = Some(SessionEvent::Finished(session.winner()));
        }

        if let Some(event) = event {
            frontend.on_event(&session, &event);
            match event {
                SessionEvent::Denied(reason) => bail!("join denied: {}", reason),
                SessionEvent::Finished(_) if frontend.exit_after_match() => break,
                _ => {}
            }
        }
        frontend.draw(&session)?;
    }

    Ok(())
}

fn spawn_autoplay(
    mut bot: AutoPlayer,
    every: Duration,
    controls: mpsc::UnboundedSender<Control>,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            if controls.send(bot.next_control()).is_err() {
                break;
            }
        }
    });
}

/// Terminal key events are read on a plain thread; crossterm's poll blocks.
fn spawn_key_reader(controls: mpsc::UnboundedSender<Control>) {
    std::thread::spawn(move || {
        use crossterm::event::{self, Event, KeyEventKind};

        let mut keys = KeyMap::default();

        loop {
            match event::poll(Duration::from_millis(50)) {
                Ok(false) => {
                    if controls.is_closed() {
                        break;
                    }
                    continue;
                }
                Ok(true) => {}
                Err(e) => {
                    log::warn!("terminal input failed: {}", e);
                    let _ = controls.send(Control::Quit);
                    break;
                }
            }

            let Ok(Event::Key(key)) = event::read() else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(control) = keys.map(key.code, key.modifiers) {
                let quit = control == Control::Quit;
                if controls.send(control).is_err() || quit {
                    break;
                }
            }
        }
    });
}
