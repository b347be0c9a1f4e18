use serde::Deserialize;

use super::defaults::*;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_monitor_interval_secs")]
    pub monitor_interval_secs: u64,
    #[serde(default)]
    pub weather: Weather,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub alert_titles: AlertTitles,
    #[serde(default)]
    pub alert_feed: AlertFeedConfig,
    #[serde(default)]
    pub alert_state: AlertStateConfig,
    #[serde(default)]
    pub simulation: Simulation,
    #[serde(default)]
    pub points: Vec<PointConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Weather {
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Millimetres of rain in the current hour above which an alert fires.
#[derive(Debug, Clone, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_heavy_rain_mm")]
    pub heavy_rain_mm: f64,
    #[serde(default = "default_flood_mm")]
    pub flood_mm: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertTitles {
    #[serde(default = "default_heavy_rain_title")]
    pub heavy_rain: String,
    #[serde(default = "default_flood_title")]
    pub flood: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertFeedConfig {
    #[serde(default = "default_alert_feed_path")]
    pub path: String,
    #[serde(default = "default_alert_feed_max_file_size_bytes")]
    pub max_file_size_bytes: u64,
    #[serde(default = "default_alert_feed_retained_files")]
    pub retained_files: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStateBackend {
    Memory,
    Sled,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertStateConfig {
    #[serde(default = "default_alert_state_backend")]
    pub backend: AlertStateBackend,
    #[serde(default = "default_alert_state_path")]
    pub path: String,
    #[serde(default = "default_claim_ttl_secs")]
    pub claim_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Simulation {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_simulation_profile")]
    pub profile: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PointConfig {
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
}
