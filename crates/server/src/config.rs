use duel::PacketLossSimulation;
use duel::room::DEFAULT_RESYNC_PROBABILITY;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Chance that a relayed action is followed by a full room resync.
    pub resync_probability: f64,
    pub packet_loss: Option<PacketLossSimulation>,
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{}", duel::DEFAULT_PORT),
            resync_probability: DEFAULT_RESYNC_PROBABILITY,
            packet_loss: None,
            seed: None,
        }
    }
}
