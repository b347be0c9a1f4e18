use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};

use crate::alert_feed::AlertPublisher;
use crate::alert_state::AlertStateStore;
use crate::monitor::MonitorPipeline;
use crate::weather::WeatherProvider;

/// Owner of a running monitor loop.
pub struct MonitorHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Signals the loop, aborts any in-flight cycle and waits for the loop to exit.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(error) = self.task.await {
            log::error!("monitor_job_join_failed error={}", error);
        }
    }
}

pub fn start_monitor_job<P, S, A>(
    pipeline: Arc<MonitorPipeline<P, S, A>>,
    period: Duration,
) -> MonitorHandle
where
    P: WeatherProvider + 'static,
    S: AlertStateStore + Send + Sync + 'static,
    A: AlertPublisher + Send + Sync + 'static,
{
    let (stop_tx, mut stop_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let origin = Instant::now();
        let mut ticker = interval_at(origin, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut previous_tick = None;

        log::info!(
            "monitor_job_started interval_secs={} points={}",
            period.as_secs(),
            pipeline.points().len()
        );

        loop {
            let scheduled = tokio::select! {
                biased;
                _ = stop_requested(&mut stop_rx) => break,
                scheduled = ticker.tick() => scheduled,
            };

            let now = Utc::now();
            if let Some(previous) = previous_tick {
                let elapsed_secs = now.signed_duration_since(previous).num_seconds().max(0);
                let threshold_secs =
                    i64::try_from(period.as_secs().saturating_mul(2)).unwrap_or(i64::MAX);
                if elapsed_secs > threshold_secs {
                    log::warn!(
                        "monitor_loop_delayed elapsed_secs={} threshold_secs={}",
                        elapsed_secs,
                        threshold_secs
                    );
                }
            }
            previous_tick = Some(now);

            let cycle_pipeline = Arc::clone(&pipeline);
            let cycle_stop = stop_rx.clone();
            let mut cycle =
                tokio::spawn(async move { cycle_pipeline.check_alerts(&cycle_stop).await });

            tokio::select! {
                biased;
                _ = stop_requested(&mut stop_rx) => {
                    cycle.abort();
                    let _ = cycle.await;
                    log::info!("monitor_cycle_aborted reason=stop_requested");
                    break;
                }
                joined = &mut cycle => {
                    if let Err(error) = joined {
                        if error.is_panic() {
                            log::error!("CRITICAL: monitor cycle panicked, continuing: {}", error);
                        } else {
                            log::warn!("monitor_cycle_cancelled error={}", error);
                        }
                    }
                }
            }

            let finished = Instant::now();
            let skipped = slot_of(origin, finished, period) - slot_of(origin, scheduled, period);
            if skipped > 0 {
                log::warn!(
                    "monitor_ticks_skipped count={} reason=cycle_outlasted_interval",
                    skipped
                );
            }
            ticker.reset_at(next_boundary(origin, finished, period));
        }

        log::info!("monitor_job_stopped");
    });

    MonitorHandle { stop_tx, task }
}

/// Index of the interval slot containing `at`, counted from `origin`.
fn slot_of(origin: Instant, at: Instant, period: Duration) -> u128 {
    at.saturating_duration_since(origin).as_nanos() / period.as_nanos().max(1)
}

/// First slot boundary strictly after `now`. Ticks that fell inside a cycle are
/// dropped rather than fired late.
fn next_boundary(origin: Instant, now: Instant, period: Duration) -> Instant {
    let slots = slot_of(origin, now, period) + 1;
    let offset = period.as_nanos().max(1).saturating_mul(slots);
    origin
        .checked_add(Duration::from_nanos(u64::try_from(offset).unwrap_or(u64::MAX)))
        .unwrap_or(now + period)
}

/// Resolves once stop is signalled or every sender is gone.
async fn stop_requested(stop_rx: &mut watch::Receiver<bool>) {
    loop {
        if *stop_rx.borrow_and_update() {
            return;
        }
        if stop_rx.changed().await.is_err() {
            return;
        }
    }
}
