use duel::SimulationConfig;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_addr: String,
    pub room: String,
    /// Fixes the local board's randomness when set.
    pub seed: Option<u64>,
    pub simulation: SimulationConfig,
    pub autoplay_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: format!("127.0.0.1:{}", duel::DEFAULT_PORT),
            room: String::new(),
            seed: None,
            simulation: SimulationConfig::default(),
            autoplay_interval_ms: 250,
        }
    }
}
