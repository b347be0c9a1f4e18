use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;

use crate::alert_feed::JsonlAlertFeed;
use crate::alert_state::{ActiveAlertStateStore, StateStoreError};
use crate::config::Config;
use crate::monitor::MonitorPipeline;
use crate::weather::{
    ActiveWeatherProvider, OpenMeteoClient, SimulatedWeatherProvider, WeatherError,
};

pub type LivePipeline =
    MonitorPipeline<ActiveWeatherProvider, ActiveAlertStateStore, JsonlAlertFeed>;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("weather client setup failed: {0}")]
    Weather(#[from] WeatherError),
    #[error("alert state store unavailable: {0}")]
    State(#[from] StateStoreError),
}

#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub pipeline: Arc<LivePipeline>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self, StartupError> {
        let provider = if config.simulation.enabled {
            log::warn!(
                "simulation_mode_enabled profile={} source=weather_provider",
                config.simulation.profile
            );
            ActiveWeatherProvider::Simulated(SimulatedWeatherProvider::new(
                &config.simulation.profile,
                Utc::now(),
            ))
        } else {
            ActiveWeatherProvider::Real(OpenMeteoClient::new(
                &config.weather.base_url,
                Duration::from_secs(config.weather.request_timeout_secs),
            )?)
        };

        let store = ActiveAlertStateStore::open_from_config(&config)?;
        let feed = JsonlAlertFeed::from_config(&config);
        let pipeline = MonitorPipeline::from_config(&config, provider, store, feed);

        Ok(Self {
            config,
            pipeline: Arc::new(pipeline),
        })
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.config.monitor_interval_secs)
    }
}
