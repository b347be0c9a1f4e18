mod model;
mod open_meteo;
mod provider;

pub use model::{PointReading, WeatherError};
pub use open_meteo::OpenMeteoClient;
pub use provider::{ActiveWeatherProvider, SimulatedWeatherProvider, WeatherProvider};

#[cfg(test)]
pub(crate) use provider::MockWeatherProvider;
