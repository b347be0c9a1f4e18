use thiserror::Error;

use super::defaults::MAX_CLAIM_TTL_SECS;
use super::schema::{AlertStateBackend, Config};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Validation(String),
}

const SIMULATION_PROFILES: &[&str] = &["wave", "storm"];

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monitor_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "monitor_interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.weather.base_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "weather.base_url must not be empty".to_string(),
            ));
        }
        if self.weather.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "weather.request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        validate_millimetres("thresholds.heavy_rain_mm", self.thresholds.heavy_rain_mm)?;
        validate_millimetres("thresholds.flood_mm", self.thresholds.flood_mm)?;
        if self.thresholds.heavy_rain_mm >= self.thresholds.flood_mm {
            return Err(ConfigError::Validation(
                "thresholds.heavy_rain_mm must be lower than thresholds.flood_mm".to_string(),
            ));
        }
        if self.alert_titles.heavy_rain.trim().is_empty() {
            return Err(ConfigError::Validation(
                "alert_titles.heavy_rain must not be empty".to_string(),
            ));
        }
        if self.alert_titles.flood.trim().is_empty() {
            return Err(ConfigError::Validation(
                "alert_titles.flood must not be empty".to_string(),
            ));
        }
        if self.alert_feed.path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "alert_feed.path must not be empty".to_string(),
            ));
        }
        if self.alert_feed.max_file_size_bytes == 0 {
            return Err(ConfigError::Validation(
                "alert_feed.max_file_size_bytes must be greater than 0".to_string(),
            ));
        }
        if self.alert_feed.retained_files == 0 {
            return Err(ConfigError::Validation(
                "alert_feed.retained_files must be greater than 0".to_string(),
            ));
        }
        if self.alert_state.backend == AlertStateBackend::Sled
            && self.alert_state.path.trim().is_empty()
        {
            return Err(ConfigError::Validation(
                "alert_state.path must not be empty when alert_state.backend is sled".to_string(),
            ));
        }
        if self.alert_state.claim_ttl_secs == 0
            || self.alert_state.claim_ttl_secs > MAX_CLAIM_TTL_SECS
        {
            return Err(ConfigError::Validation(format!(
                "alert_state.claim_ttl_secs must be between 1 and {}",
                MAX_CLAIM_TTL_SECS
            )));
        }
        if !SIMULATION_PROFILES.contains(&self.simulation.profile.as_str()) {
            return Err(ConfigError::Validation(format!(
                "simulation.profile must be one of: {}",
                SIMULATION_PROFILES.join(", ")
            )));
        }
        for (index, point) in self.points.iter().enumerate() {
            if point.label.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "points[{}].label must not be empty",
                    index
                )));
            }
            if point.latitude.is_nan() || !(-90.0..=90.0).contains(&point.latitude) {
                return Err(ConfigError::Validation(format!(
                    "points[{}].latitude must be between -90 and 90",
                    index
                )));
            }
            if point.longitude.is_nan() || !(-180.0..=180.0).contains(&point.longitude) {
                return Err(ConfigError::Validation(format!(
                    "points[{}].longitude must be between -180 and 180",
                    index
                )));
            }
        }
        Ok(())
    }
}

fn validate_millimetres(field: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be a positive number of millimetres",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::config::load_config;

    fn write_config(body: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, body).expect("config should be written");
        (dir, path)
    }

    #[test]
    fn empty_file_loads_with_defaults() {
        let (_dir, path) = write_config("");
        let config = load_config(&path).expect("defaults should be valid");

        assert_eq!(config.monitor_interval_secs, 300);
        assert_eq!(config.weather.request_timeout_secs, 10);
        assert_eq!(config.thresholds.heavy_rain_mm, 15.0);
        assert_eq!(config.thresholds.flood_mm, 30.0);
        assert!(config.points.is_empty());
    }

    #[test]
    fn bundled_example_config_is_valid() {
        let config = crate::config::io::parse_config(
            include_str!("../../config.example.toml"),
            "config.example.toml",
        )
        .expect("example config should validate");

        assert_eq!(config.points.len(), 4);
        assert_eq!(config.alert_state.backend, crate::config::AlertStateBackend::Sled);
    }

    #[test]
    fn points_are_parsed_in_order() {
        let (_dir, path) = write_config(
            r#"
[[points]]
label = "1 - Khairatabad Junction"
latitude = 17.4126
longitude = 78.4631

[[points]]
label = "2 - Lakdikapul"
latitude = 17.4036
longitude = 78.4637
"#,
        );
        let config = load_config(&path).expect("config should load");

        assert_eq!(config.points.len(), 2);
        assert_eq!(config.points[0].label, "1 - Khairatabad Junction");
        assert_eq!(config.points[1].latitude, 17.4036);
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let (_dir, path) = write_config(
            r#"
[thresholds]
heavy_rain_mm = 40.0
flood_mm = 30.0
"#,
        );
        let error = load_config(&path).expect_err("inverted thresholds should fail");
        assert!(error.to_string().contains("heavy_rain_mm must be lower"));
    }

    #[test]
    fn claim_ttl_beyond_one_day_is_rejected() {
        let (_dir, path) = write_config(
            r#"
[alert_state]
backend = "memory"
claim_ttl_secs = 10000000000000000
"#,
        );
        let error = load_config(&path).expect_err("oversized claim TTL should fail");
        assert!(error.to_string().contains("alert_state.claim_ttl_secs"));

        let (_dir, path) = write_config("[alert_state]\nclaim_ttl_secs = 86400\n");
        assert!(load_config(&path).is_ok());
    }

    #[test]
    fn out_of_range_latitude_is_rejected() {
        let (_dir, path) = write_config(
            r#"
[[points]]
label = "nowhere"
latitude = 123.0
longitude = 78.0
"#,
        );
        let error = load_config(&path).expect_err("latitude should be validated");
        assert!(error.to_string().contains("points[0].latitude"));
    }

    #[test]
    fn unknown_simulation_profile_is_rejected() {
        let (_dir, path) = write_config(
            r#"
[simulation]
enabled = true
profile = "drizzle"
"#,
        );
        let error = load_config(&path).expect_err("profile should be validated");
        assert!(error.to_string().contains("simulation.profile"));
    }
}
