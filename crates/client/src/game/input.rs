use crossterm::event::{KeyCode, KeyModifiers};
use rand::Rng;
use rand::rngs::StdRng;

use duel::{Direction, PlayerInput};

const MAX_CHAT_LEN: usize = 120;

/// Everything the game loop can be asked to do from outside the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    Input(PlayerInput),
    Start,
    Quit,
    /// The chat prompt changed; `None` closes it.
    ChatDraft(Option<String>),
    Chat(String),
}

pub fn map_key(code: KeyCode, modifiers: KeyModifiers) -> Option<Control> {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Some(Control::Quit);
    }

    let control = match code {
        KeyCode::Left => Control::Input(PlayerInput::Move(Direction::Left)),
        KeyCode::Right => Control::Input(PlayerInput::Move(Direction::Right)),
        KeyCode::Up => Control::Input(PlayerInput::Move(Direction::Up)),
        KeyCode::Down => Control::Input(PlayerInput::Move(Direction::Down)),
        KeyCode::Char(' ') => Control::Input(PlayerInput::Swap),
        KeyCode::Char('r') | KeyCode::Char('R') => Control::Input(PlayerInput::Rise),
        KeyCode::Enter => Control::Start,
        KeyCode::Char('q') | KeyCode::Esc => Control::Quit,
        _ => return None,
    };
    Some(control)
}

/// Key handling with a one-line chat prompt. While the prompt is open every
/// printable key goes into the draft instead of the game.
#[derive(Debug, Default)]
pub struct KeyMap {
    draft: Option<String>,
}

impl KeyMap {
    pub fn map(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Option<Control> {
        if self.draft.is_none() {
            if matches!(code, KeyCode::Char('t') | KeyCode::Char('T')) {
                self.draft = Some(String::new());
                return Some(Control::ChatDraft(Some(String::new())));
            }
            return map_key(code, modifiers);
        }
        let Some(draft) = self.draft.as_mut() else {
            return None;
        };

        if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
            return Some(Control::Quit);
        }

        match code {
            KeyCode::Char(c) if draft.chars().count() < MAX_CHAT_LEN => draft.push(c),
            KeyCode::Backspace => {
                draft.pop();
            }
            KeyCode::Esc => {
                self.draft = None;
                return Some(Control::ChatDraft(None));
            }
            KeyCode::Enter => {
                let text = self.draft.take().unwrap_or_default();
                let text = text.trim();
                if text.is_empty() {
                    return Some(Control::ChatDraft(None));
                }
                return Some(Control::Chat(text.to_string()));
            }
            _ => return None,
        }
        Some(Control::ChatDraft(Some(draft.clone())))
    }
}

const DIRECTIONS: [Direction; 4] = [
    Direction::Left,
    Direction::Right,
    Direction::Up,
    Direction::Down,
];

/// Random button masher for headless runs. Mostly moves and swaps, with the
/// occasional rise, and keeps asking to start so a match begins as soon as an
/// opponent is in the room.
pub struct AutoPlayer {
    rng: StdRng,
}

impl AutoPlayer {
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }

    pub fn next_control(&mut self) -> Control {
        match self.rng.gen_range(0..100) {
            0..55 => {
                let direction = DIRECTIONS[self.rng.gen_range(0..DIRECTIONS.len())];
                Control::Input(PlayerInput::Move(direction))
            }
            55..90 => Control::Input(PlayerInput::Swap),
            90..95 => Control::Input(PlayerInput::Rise),
            _ => Control::Start,
        }
    }
}
