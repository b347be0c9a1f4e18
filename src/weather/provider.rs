use std::future::Future;

use chrono::{DateTime, Utc};

use crate::points::MonitoredPoint;

use super::model::{PointReading, WeatherError};
use super::open_meteo::{OpenMeteoClient, truncate_to_hour};

/// Source of current-hour rainfall for a single point. Futures are `Send` so
/// cycles can run on spawned tasks.
pub trait WeatherProvider: Send + Sync {
    fn fetch_hourly_precipitation(
        &self,
        point: &MonitoredPoint,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<PointReading, WeatherError>> + Send;
}

pub enum ActiveWeatherProvider {
    Real(OpenMeteoClient),
    Simulated(SimulatedWeatherProvider),
}

impl WeatherProvider for ActiveWeatherProvider {
    async fn fetch_hourly_precipitation(
        &self,
        point: &MonitoredPoint,
        now: DateTime<Utc>,
    ) -> Result<PointReading, WeatherError> {
        match self {
            ActiveWeatherProvider::Real(provider) => {
                provider.fetch_hourly_precipitation(point, now).await
            }
            ActiveWeatherProvider::Simulated(provider) => {
                provider.fetch_hourly_precipitation(point, now).await
            }
        }
    }
}

/// Offline rainfall generator for drills.
///
/// `wave` oscillates below the alert thresholds and spikes past them
/// periodically; `storm` ramps steadily until it passes the flood threshold.
/// Values depend only on the time elapsed since `started_at`, in five-minute
/// slots, and on the point label.
pub struct SimulatedWeatherProvider {
    profile: String,
    started_at: DateTime<Utc>,
}

impl SimulatedWeatherProvider {
    pub fn new(profile: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            profile: profile.to_string(),
            started_at,
        }
    }

    fn precipitation_at(&self, point: &MonitoredPoint, now: DateTime<Utc>) -> f64 {
        let slot = (now.signed_duration_since(self.started_at).num_minutes() / 5).max(0);
        let offset = (point.label.len() % 7) as f64 * 0.4;

        let precipitation = match self.profile.as_str() {
            "storm" => slot as f64 * 3.0 + offset,
            _ => {
                if slot % 36 == 30 {
                    34.0 + offset
                } else if slot % 12 == 6 {
                    18.0 + offset
                } else {
                    6.0 + ((slot as f64 / 4.0) + offset).sin() * 6.0
                }
            }
        };

        precipitation.clamp(0.0, 45.0)
    }
}

impl WeatherProvider for SimulatedWeatherProvider {
    async fn fetch_hourly_precipitation(
        &self,
        point: &MonitoredPoint,
        now: DateTime<Utc>,
    ) -> Result<PointReading, WeatherError> {
        let precipitation_mm = self.precipitation_at(point, now);
        let precipitation_probability_pct = (20.0 + precipitation_mm * 4.0).clamp(0.0, 100.0) as u8;

        Ok(PointReading {
            point: point.clone(),
            precipitation_mm,
            precipitation_probability_pct,
            observed_at_hour: truncate_to_hour(now),
        })
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Copy)]
enum MockOutcome {
    Reading { mm: f64, pct: u8 },
    Failure,
}

/// Scripted provider: each label replays its outcomes in order and fails once
/// the script runs out.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MockWeatherProvider {
    scripts: std::sync::Mutex<std::collections::HashMap<String, Vec<MockOutcome>>>,
    delay: Option<std::time::Duration>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockWeatherProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reading(self, label: &str, mm: f64, pct: u8) -> Self {
        self.push(label, MockOutcome::Reading { mm, pct })
    }

    pub(crate) fn failure(self, label: &str) -> Self {
        self.push(label, MockOutcome::Failure)
    }

    pub(crate) fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn push(self, label: &str, outcome: MockOutcome) -> Self {
        self.scripts
            .lock()
            .expect("mock scripts lock")
            .entry(label.to_string())
            .or_default()
            .push(outcome);
        self
    }
}

#[cfg(test)]
impl WeatherProvider for MockWeatherProvider {
    async fn fetch_hourly_precipitation(
        &self,
        point: &MonitoredPoint,
        now: DateTime<Utc>,
    ) -> Result<PointReading, WeatherError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = {
            let mut scripts = self.scripts.lock().expect("mock scripts lock");
            scripts
                .get_mut(&point.label)
                .filter(|script| !script.is_empty())
                .map(|script| script.remove(0))
                .unwrap_or(MockOutcome::Failure)
        };

        match next {
            MockOutcome::Reading { mm, pct } => Ok(PointReading {
                point: point.clone(),
                precipitation_mm: mm,
                precipitation_probability_pct: pct,
                observed_at_hour: truncate_to_hour(now),
            }),
            MockOutcome::Failure => Err(WeatherError::Status(503)),
        }
    }
}
