use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub map: MapSettings,
    #[serde(default)]
    pub feed: FeedSettings,
}

#[derive(Debug, Default, Deserialize)]
pub struct MapSettings {
    pub boundaries_url: Option<String>, // GeoJSON FeatureCollection endpoint
    pub geoip_db: Option<PathBuf>,      // Path to GeoLite2-City.mmdb database
    pub light: Option<bool>,            // Light terminal palette
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedSettings {
    pub url: Option<String>, // WebSocket attack feed (ws:// or wss://)
    pub seed: Option<u64>,
    pub rate: Option<f64>,
}

impl Settings {
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("threatmap")
            .join("config.toml")
    }
}
