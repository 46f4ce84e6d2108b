mod command;
mod config;
mod tick;

pub use command::{InputOutcome, PlayerInput};
pub use config::SimulationConfig;
pub use tick::{LocalSimulated, MatchClock, TickReport};
