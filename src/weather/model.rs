use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::points::MonitoredPoint;

/// Current-hour rainfall at one point, built fresh every cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointReading {
    pub point: MonitoredPoint,
    pub precipitation_mm: f64,
    pub precipitation_probability_pct: u8,
    pub observed_at_hour: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("forecast request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("forecast provider returned HTTP {0}")]
    Status(u16),
    #[error("malformed forecast response: {0}")]
    Parse(String),
    #[error(
        "hourly series are misaligned: {times} times, {precipitation} precipitation values, \
         {probability} probability values"
    )]
    Misaligned {
        times: usize,
        precipitation: usize,
        probability: usize,
    },
}

impl WeatherError {
    /// Short machine-friendly tag used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            WeatherError::Http(error) if error.is_timeout() => "timeout",
            WeatherError::Http(_) => "http",
            WeatherError::Status(_) => "status",
            WeatherError::Parse(_) => "parse",
            WeatherError::Misaligned { .. } => "misaligned",
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ForecastResponse {
    pub(super) hourly: HourlySeries,
}

/// `hourly` block of an Open-Meteo forecast. The three arrays are aligned
/// index-for-index; individual values may be null.
#[derive(Debug, Deserialize)]
pub(super) struct HourlySeries {
    pub(super) time: Vec<String>,
    #[serde(default)]
    pub(super) precipitation: Vec<Option<f64>>,
    #[serde(default)]
    pub(super) precipitation_probability: Vec<Option<f64>>,
}
