use super::schema::{
    AlertFeedConfig, AlertStateBackend, AlertStateConfig, AlertTitles, Simulation, Thresholds,
    Weather,
};

pub(super) fn default_monitor_interval_secs() -> u64 {
    300
}

pub(super) fn default_weather_base_url() -> String {
    "https://api.open-meteo.com".to_string()
}

pub(super) fn default_request_timeout_secs() -> u64 {
    10
}

pub(super) fn default_heavy_rain_mm() -> f64 {
    15.0
}

pub(super) fn default_flood_mm() -> f64 {
    30.0
}

pub(super) fn default_heavy_rain_title() -> String {
    "Heavy rainfall alert: more than 15 mm of rain expected this hour. Avoid waterlogged roads."
        .to_string()
}

pub(super) fn default_flood_title() -> String {
    "Flood warning: more than 30 mm of rain expected this hour. Stay indoors and away from drains."
        .to_string()
}

pub(super) fn default_alert_feed_path() -> String {
    "data/alert_feed/alerts.jsonl".to_string()
}

pub(super) fn default_alert_feed_max_file_size_bytes() -> u64 {
    10 * 1024 * 1024
}

pub(super) fn default_alert_feed_retained_files() -> u16 {
    5
}

pub(super) fn default_alert_state_backend() -> AlertStateBackend {
    AlertStateBackend::Sled
}

pub(super) fn default_alert_state_path() -> String {
    "data/alert_state".to_string()
}

/// Upper bound for `alert_state.claim_ttl_secs`: one day.
pub const MAX_CLAIM_TTL_SECS: u64 = 86_400;

pub(super) fn default_claim_ttl_secs() -> u64 {
    120
}

pub(super) fn default_simulation_profile() -> String {
    "wave".to_string()
}

impl Default for Weather {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            heavy_rain_mm: default_heavy_rain_mm(),
            flood_mm: default_flood_mm(),
        }
    }
}

impl Default for AlertTitles {
    fn default() -> Self {
        Self {
            heavy_rain: default_heavy_rain_title(),
            flood: default_flood_title(),
        }
    }
}

impl Default for AlertFeedConfig {
    fn default() -> Self {
        Self {
            path: default_alert_feed_path(),
            max_file_size_bytes: default_alert_feed_max_file_size_bytes(),
            retained_files: default_alert_feed_retained_files(),
        }
    }
}

impl Default for AlertStateConfig {
    fn default() -> Self {
        Self {
            backend: default_alert_state_backend(),
            path: default_alert_state_path(),
            claim_ttl_secs: default_claim_ttl_secs(),
        }
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            enabled: false,
            profile: default_simulation_profile(),
        }
    }
}
