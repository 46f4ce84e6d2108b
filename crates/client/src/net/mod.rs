mod config;
mod connection;

pub use config::ClientConfig;
pub use connection::ServerConnection;
