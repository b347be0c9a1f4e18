use chrono::{DateTime, Utc};
use futures::future::join_all;

use crate::points::MonitoredPoint;
use crate::weather::{PointReading, WeatherProvider};

use super::model::AggregateSample;

pub(crate) struct CycleOutcome {
    pub(crate) sample: AggregateSample,
    pub(crate) readings: Vec<PointReading>,
    pub(crate) failed_points: usize,
}

/// Fetches every point concurrently, waits for all of them, then reduces.
/// A failed point is logged and left out; it never fails the cycle.
pub(crate) async fn run_cycle<P: WeatherProvider>(
    provider: &P,
    points: &[MonitoredPoint],
    now: DateTime<Utc>,
) -> CycleOutcome {
    let results = join_all(
        points
            .iter()
            .map(|point| provider.fetch_hourly_precipitation(point, now)),
    )
    .await;

    let mut readings = Vec::with_capacity(points.len());
    let mut failed_points = 0;
    for (point, result) in points.iter().zip(results) {
        match result {
            Ok(reading) => readings.push(reading),
            Err(error) => {
                failed_points += 1;
                log::warn!(
                    "weather_fetch_failed point={:?} lat={} lng={} kind={} error={}",
                    point.label,
                    point.latitude,
                    point.longitude,
                    error.kind(),
                    error
                );
            }
        }
    }

    let sample = reduce_readings(&readings, now);
    CycleOutcome {
        sample,
        readings,
        failed_points,
    }
}

pub(crate) fn reduce_readings(
    readings: &[PointReading],
    cycle_timestamp: DateTime<Utc>,
) -> AggregateSample {
    let peak = readings
        .iter()
        .fold(None::<&PointReading>, |best, reading| match best {
            Some(best) if reading.precipitation_mm <= best.precipitation_mm => Some(best),
            _ => Some(reading),
        });

    let Some(peak) = peak else {
        return AggregateSample::empty(cycle_timestamp);
    };

    AggregateSample {
        max_precipitation_mm: peak.precipitation_mm,
        max_precipitation_probability_pct: peak.precipitation_probability_pct,
        sample_count: readings.len(),
        cycle_timestamp,
        peak_point: Some(peak.point.clone()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{reduce_readings, run_cycle};
    use crate::points::MonitoredPoint;
    use crate::weather::MockWeatherProvider;

    fn points(labels: &[&str]) -> Vec<MonitoredPoint> {
        labels
            .iter()
            .enumerate()
            .map(|(index, label)| MonitoredPoint::new(*label, 17.40 + index as f64 * 0.01, 78.46))
            .collect()
    }

    #[tokio::test]
    async fn maximum_is_taken_across_points() {
        let provider = MockWeatherProvider::new()
            .reading("A", 5.0, 30)
            .reading("B", 12.0, 70);
        let outcome = run_cycle(&provider, &points(&["A", "B"]), Utc::now()).await;

        assert_eq!(outcome.sample.max_precipitation_mm, 12.0);
        assert_eq!(outcome.sample.sample_count, 2);
        assert_eq!(outcome.failed_points, 0);
        assert_eq!(
            outcome.sample.peak_point.map(|point| point.label),
            Some("B".to_string())
        );
    }

    #[tokio::test]
    async fn probability_comes_from_the_peak_reading() {
        let provider = MockWeatherProvider::new()
            .reading("A", 20.0, 40)
            .reading("B", 8.0, 95);
        let outcome = run_cycle(&provider, &points(&["A", "B"]), Utc::now()).await;

        assert_eq!(outcome.sample.max_precipitation_mm, 20.0);
        assert_eq!(outcome.sample.max_precipitation_probability_pct, 40);
    }

    #[tokio::test]
    async fn failed_point_does_not_blank_the_cycle() {
        let provider = MockWeatherProvider::new()
            .failure("A")
            .reading("B", 9.5, 55);
        let outcome = run_cycle(&provider, &points(&["A", "B"]), Utc::now()).await;

        assert_eq!(outcome.failed_points, 1);
        assert_eq!(outcome.sample.sample_count, 1);
        assert_eq!(outcome.sample.max_precipitation_mm, 9.5);
    }

    #[tokio::test]
    async fn all_points_failing_reads_zero() {
        let provider = MockWeatherProvider::new().failure("A");
        let outcome = run_cycle(&provider, &points(&["A"]), Utc::now()).await;

        assert_eq!(outcome.failed_points, 1);
        assert_eq!(outcome.sample.max_precipitation_mm, 0.0);
        assert_eq!(outcome.sample.sample_count, 0);
        assert!(outcome.sample.peak_point.is_none());
    }

    #[tokio::test]
    async fn no_points_reads_zero_without_fetching() {
        let provider = MockWeatherProvider::new();
        let outcome = run_cycle(&provider, &[], Utc::now()).await;

        assert_eq!(outcome.sample.max_precipitation_mm, 0.0);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn fetches_run_concurrently() {
        let provider = MockWeatherProvider::new()
            .reading("A", 1.0, 10)
            .reading("B", 2.0, 10)
            .reading("C", 3.0, 10)
            .with_delay(std::time::Duration::from_millis(200));

        let started = std::time::Instant::now();
        let outcome = run_cycle(&provider, &points(&["A", "B", "C"]), Utc::now()).await;

        assert_eq!(outcome.sample.sample_count, 3);
        assert!(started.elapsed() < std::time::Duration::from_millis(550));
    }

    #[test]
    fn ties_keep_the_first_point() {
        let provider_points = points(&["A", "B"]);
        let now = Utc::now();
        let readings = provider_points
            .iter()
            .zip([(14.0, 20), (14.0, 90)])
            .map(|(point, (mm, pct))| crate::weather::PointReading {
                point: point.clone(),
                precipitation_mm: mm,
                precipitation_probability_pct: pct,
                observed_at_hour: now,
            })
            .collect::<Vec<_>>();

        let sample = reduce_readings(&readings, now);
        assert_eq!(sample.max_precipitation_probability_pct, 20);
        assert_eq!(
            sample.peak_point.map(|point| point.label),
            Some("A".to_string())
        );
    }
}
