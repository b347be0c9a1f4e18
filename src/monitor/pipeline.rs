use chrono::Utc;
use tokio::sync::{Mutex, watch};

use crate::alert_feed::AlertPublisher;
use crate::alert_state::AlertStateStore;
use crate::config::{AlertTitles, Config, Thresholds};
use crate::points::{MonitoredPoint, points_from_config};
use crate::weather::WeatherProvider;

use super::aggregator::run_cycle;
use super::evaluator::evaluate_and_publish;
use super::model::CycleReport;
use super::severity::SeverityBand;

/// One monitoring cycle wired to its collaborators: fetch every point,
/// reduce, evaluate against the alert flags and maybe publish.
pub struct MonitorPipeline<P, S, A> {
    provider: P,
    store: S,
    publisher: A,
    points: Vec<MonitoredPoint>,
    thresholds: Thresholds,
    titles: AlertTitles,
    cycle_gate: Mutex<()>,
}

impl<P, S, A> MonitorPipeline<P, S, A>
where
    P: WeatherProvider,
    S: AlertStateStore,
    A: AlertPublisher,
{
    pub fn new(
        provider: P,
        store: S,
        publisher: A,
        points: Vec<MonitoredPoint>,
        thresholds: Thresholds,
        titles: AlertTitles,
    ) -> Self {
        Self {
            provider,
            store,
            publisher,
            points,
            thresholds,
            titles,
            cycle_gate: Mutex::new(()),
        }
    }

    pub fn from_config(config: &Config, provider: P, store: S, publisher: A) -> Self {
        Self::new(
            provider,
            store,
            publisher,
            points_from_config(config),
            config.thresholds.clone(),
            config.alert_titles.clone(),
        )
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn publisher(&self) -> &A {
        &self.publisher
    }

    pub fn points(&self) -> &[MonitoredPoint] {
        &self.points
    }

    /// Runs one cycle. Returns `None` when another cycle already holds the
    /// gate or when `stop` flipped before evaluation.
    pub async fn check_alerts(&self, stop: &watch::Receiver<bool>) -> Option<CycleReport> {
        let Ok(_gate) = self.cycle_gate.try_lock() else {
            log::warn!("monitor_cycle_skipped reason=cycle_in_flight");
            return None;
        };

        let now = Utc::now();
        let outcome = run_cycle(&self.provider, &self.points, now).await;
        let sample = outcome.sample;
        let band = SeverityBand::classify(sample.max_precipitation_mm);

        tracing::info!(
            target: "monitor",
            module = "monitor",
            max_precipitation_mm = sample.max_precipitation_mm,
            precipitation_probability_pct = sample.max_precipitation_probability_pct,
            sample_count = sample.sample_count,
            failed_points = outcome.failed_points,
            peak_point = sample
                .peak_point
                .as_ref()
                .map(|point| point.display_name())
                .unwrap_or("none"),
            band = %band,
            heavy_rain_threshold = self.thresholds.heavy_rain_mm,
            flood_threshold = self.thresholds.flood_mm,
            heavy_rain_over = sample.max_precipitation_mm > self.thresholds.heavy_rain_mm,
            flood_over = sample.max_precipitation_mm > self.thresholds.flood_mm,
            "monitor_sample"
        );

        if sample.sample_count == 0 && !self.points.is_empty() {
            log::warn!(
                "monitor_cycle_without_readings points={} failed_points={}",
                self.points.len(),
                outcome.failed_points
            );
        }

        if *stop.borrow() {
            log::info!("monitor_cycle_abandoned reason=stop_requested stage=evaluate");
            return None;
        }

        let alert = match evaluate_and_publish(
            &self.store,
            &self.publisher,
            &self.thresholds,
            &self.titles,
            &sample,
            now,
        ) {
            Ok(Some(alert)) => {
                log::warn!(
                    "rain_alert_published kind={} max_precipitation_mm={} peak_point={:?}",
                    alert.kind,
                    sample.max_precipitation_mm,
                    sample.peak_point.as_ref().map(|point| point.label.as_str())
                );
                Some(alert)
            }
            Ok(None) => None,
            Err(error) => {
                log::error!("CRITICAL: rain alert evaluation failed: {}", error);
                None
            }
        };

        Some(CycleReport {
            sample,
            readings: outcome.readings,
            failed_points: outcome.failed_points,
            band,
            alert,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use tokio::sync::watch;

    use super::MonitorPipeline;
    use crate::alert_feed::RecordingPublisher;
    use crate::alert_state::{AlertKind, AlertStateStore, MemoryAlertStateStore};
    use crate::config::{AlertTitles, Thresholds};
    use crate::monitor::SeverityBand;
    use crate::points::MonitoredPoint;
    use crate::weather::MockWeatherProvider;

    fn pipeline(
        provider: MockWeatherProvider,
        labels: &[&str],
    ) -> MonitorPipeline<MockWeatherProvider, MemoryAlertStateStore, RecordingPublisher> {
        let points = labels
            .iter()
            .map(|label| MonitoredPoint::new(*label, 17.41, 78.46))
            .collect();
        MonitorPipeline::new(
            provider,
            MemoryAlertStateStore::new(Duration::seconds(120)),
            RecordingPublisher::new(),
            points,
            Thresholds::default(),
            AlertTitles::default(),
        )
    }

    fn running() -> watch::Receiver<bool> {
        let (_tx, rx) = watch::channel(false);
        rx
    }

    #[tokio::test]
    async fn light_rain_publishes_nothing() {
        let pipeline = pipeline(
            MockWeatherProvider::new()
                .reading("A", 5.0, 40)
                .reading("B", 12.0, 70),
            &["A", "B"],
        );

        let report = pipeline.check_alerts(&running()).await.expect("cycle should run");

        assert_eq!(report.sample.max_precipitation_mm, 12.0);
        assert_eq!(report.band, SeverityBand::Moderate);
        assert!(report.alert.is_none());
        assert!(pipeline.publisher().titles().is_empty());
    }

    #[tokio::test]
    async fn heavy_rain_alerts_once_across_cycles() {
        let pipeline = pipeline(
            MockWeatherProvider::new()
                .reading("A", 20.0, 80)
                .reading("B", 8.0, 30)
                .reading("A", 22.0, 85)
                .reading("B", 3.0, 20),
            &["A", "B"],
        );

        let first = pipeline.check_alerts(&running()).await.expect("cycle should run");
        assert_eq!(
            first.alert.as_ref().map(|alert| alert.kind),
            Some(AlertKind::HeavyRain)
        );
        assert_eq!(first.raining_points().count(), 2);

        let second = pipeline.check_alerts(&running()).await.expect("cycle should run");
        assert!(second.alert.is_none());
        assert_eq!(pipeline.publisher().titles().len(), 1);
        assert!(pipeline.store().snapshot().expect("snapshot").heavy_rain_sent);
    }

    #[tokio::test]
    async fn flood_alerts_once_across_cycles() {
        let pipeline = pipeline(
            MockWeatherProvider::new()
                .reading("A", 35.0, 95)
                .reading("A", 40.0, 95),
            &["A"],
        );

        let first = pipeline.check_alerts(&running()).await.expect("cycle should run");
        assert_eq!(
            first.alert.as_ref().map(|alert| alert.kind),
            Some(AlertKind::Flood)
        );

        let second = pipeline.check_alerts(&running()).await.expect("cycle should run");
        assert_eq!(second.sample.max_precipitation_mm, 40.0);
        assert!(second.alert.is_none());
        assert_eq!(pipeline.publisher().titles(), vec![AlertTitles::default().flood]);

        let state = pipeline.store().snapshot().expect("snapshot");
        assert!(state.flood_sent);
        assert!(!state.heavy_rain_sent);
    }

    #[tokio::test]
    async fn failed_fetch_reads_zero_and_stays_quiet() {
        let pipeline = pipeline(MockWeatherProvider::new().failure("A"), &["A"]);

        let report = pipeline.check_alerts(&running()).await.expect("cycle should run");

        assert_eq!(report.failed_points, 1);
        assert_eq!(report.sample.max_precipitation_mm, 0.0);
        assert_eq!(report.band, SeverityBand::Dry);
        assert!(report.alert.is_none());
    }

    #[tokio::test]
    async fn stop_before_evaluation_publishes_nothing() {
        let pipeline = pipeline(MockWeatherProvider::new().reading("A", 35.0, 95), &["A"]);
        let (stop_tx, stop_rx) = watch::channel(false);
        stop_tx.send(true).expect("receiver alive");

        assert!(pipeline.check_alerts(&stop_rx).await.is_none());
        assert!(pipeline.publisher().titles().is_empty());
        assert!(!pipeline.store().snapshot().expect("snapshot").flood_sent);
    }

    #[tokio::test]
    async fn overlapping_cycle_is_skipped() {
        let pipeline = pipeline(
            MockWeatherProvider::new()
                .reading("A", 1.0, 10)
                .reading("A", 1.0, 10)
                .with_delay(std::time::Duration::from_millis(100)),
            &["A"],
        );
        let stop = running();

        let (first, second) = tokio::join!(
            pipeline.check_alerts(&stop),
            pipeline.check_alerts(&stop)
        );

        assert_eq!(first.is_some() as u8 + second.is_some() as u8, 1);
    }
}
