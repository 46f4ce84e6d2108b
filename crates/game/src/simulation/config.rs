#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub tick_interval_ms: u64,
    pub rise_interval_ms: u64,

    pub rise_fill_probability: f64,
    pub garbage_fill_probability: f64,

    pub initial_fill_probability: f64,
    pub initial_rows: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            rise_interval_ms: 3000,

            rise_fill_probability: 0.8,
            garbage_fill_probability: 0.9,

            initial_fill_probability: 0.7,
            initial_rows: 4,
        }
    }
}
