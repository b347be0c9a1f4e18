use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeZone, Timelike, Utc};

use crate::points::MonitoredPoint;

use super::model::{ForecastResponse, HourlySeries, PointReading, WeatherError};
use super::provider::WeatherProvider;

const HOURLY_FIELDS: &str = "precipitation,precipitation_probability";

/// Open-Meteo forecast client. One GET per point, bounded by the client timeout.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("rainwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn forecast_url(&self, point: &MonitoredPoint) -> String {
        format!(
            "{}/v1/forecast?latitude={}&longitude={}&hourly={}&current_weather=true",
            self.base_url, point.latitude, point.longitude, HOURLY_FIELDS
        )
    }
}

impl WeatherProvider for OpenMeteoClient {
    async fn fetch_hourly_precipitation(
        &self,
        point: &MonitoredPoint,
        now: DateTime<Utc>,
    ) -> Result<PointReading, WeatherError> {
        let response = self
            .client
            .get(self.forecast_url(point))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        reading_from_body(point, &body, now)
    }
}

pub(super) fn reading_from_body(
    point: &MonitoredPoint,
    body: &str,
    now: DateTime<Utc>,
) -> Result<PointReading, WeatherError> {
    let forecast: ForecastResponse =
        serde_json::from_str(body).map_err(|error| WeatherError::Parse(error.to_string()))?;

    let observed_at_hour = truncate_to_hour(now);
    let (precipitation_mm, precipitation_probability_pct) =
        resolve_hour(&forecast.hourly, observed_at_hour)?;

    Ok(PointReading {
        point: point.clone(),
        precipitation_mm,
        precipitation_probability_pct,
        observed_at_hour,
    })
}

/// Picks the series entry for `hour`. A missing entry reads as no rain.
fn resolve_hour(series: &HourlySeries, hour: DateTime<Utc>) -> Result<(f64, u8), WeatherError> {
    if series.precipitation.len() != series.time.len()
        || series.precipitation_probability.len() != series.time.len()
    {
        return Err(WeatherError::Misaligned {
            times: series.time.len(),
            precipitation: series.precipitation.len(),
            probability: series.precipitation_probability.len(),
        });
    }

    let Some(index) = series
        .time
        .iter()
        .position(|time| parse_series_hour(time) == Some(hour))
    else {
        return Ok((0.0, 0));
    };

    let precipitation = series.precipitation[index]
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
        .max(0.0);
    let probability = series.precipitation_probability[index]
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
        .clamp(0.0, 100.0)
        .round() as u8;

    Ok((precipitation, probability))
}

fn parse_series_hour(time: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M") {
        return Some(truncate_to_hour(Utc.from_utc_datetime(&naive)));
    }

    DateTime::parse_from_rfc3339(time)
        .ok()
        .map(|value| truncate_to_hour(value.with_timezone(&Utc)))
}

pub(crate) fn truncate_to_hour(value: DateTime<Utc>) -> DateTime<Utc> {
    value
        .date_naive()
        .and_hms_opt(value.hour(), 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or(value)
}
