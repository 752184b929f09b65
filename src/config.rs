use std::path::PathBuf;

/// Configuration for the interactive map view
#[derive(Clone)]
pub struct MapConfig {
    pub boundaries_url: Option<String>,
    pub geoip_db: Option<PathBuf>,
    pub time_step: f32,
    pub light: bool,
}

/// Configuration for the attack event feed
#[derive(Clone)]
pub struct FeedConfig {
    /// WebSocket feed URL; `None` runs the built-in simulator.
    pub url: Option<String>,
    /// Simulator RNG seed for reproducibility.
    pub seed: Option<u64>,
    /// Mean simulated events per tick.
    pub rate: f64,
}
