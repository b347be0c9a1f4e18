use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::alert_feed::{AlertPublisher, AlertRecord, FeedError};
use crate::alert_state::{AlertKind, AlertPhase, AlertState, AlertStateStore, StateStoreError};
use crate::config::{AlertTitles, Thresholds};

use super::model::{AggregateSample, PublishedAlert};

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    State(#[from] StateStoreError),
    #[error("failed to publish {kind} alert: {source}")]
    Publish {
        kind: AlertKind,
        #[source]
        source: FeedError,
    },
}

/// Flood is checked before heavy rain; at most one kind is returned. The
/// session only moves forward, so a sent flood alert also covers heavy rain.
pub(crate) fn decide(
    precipitation_mm: f64,
    state: &AlertState,
    thresholds: &Thresholds,
) -> Option<AlertKind> {
    let phase = state.phase();

    if precipitation_mm > thresholds.flood_mm && phase < AlertPhase::FloodWarned {
        return Some(AlertKind::Flood);
    }

    if precipitation_mm > thresholds.heavy_rain_mm && phase < AlertPhase::HeavyRainWarned {
        return Some(AlertKind::HeavyRain);
    }

    None
}

/// Publishes the alert the sample qualifies for, if any, and records it.
///
/// The flag is claimed before publishing and only committed once the feed
/// accepted the record. A failed publish releases the claim so the next
/// qualifying cycle tries again.
pub(crate) fn evaluate_and_publish<S, A>(
    store: &S,
    publisher: &A,
    thresholds: &Thresholds,
    titles: &AlertTitles,
    sample: &AggregateSample,
    now: DateTime<Utc>,
) -> Result<Option<PublishedAlert>, EvaluationError>
where
    S: AlertStateStore,
    A: AlertPublisher,
{
    let state = store.snapshot()?;
    let Some(kind) = decide(sample.max_precipitation_mm, &state, thresholds) else {
        return Ok(None);
    };

    if !store.try_claim(kind, now)? {
        log::info!("alert_claim_held_elsewhere kind={}", kind);
        return Ok(None);
    }

    match publisher.publish(kind.title(titles)) {
        Ok(record) => {
            store.commit(kind, now)?;
            Ok(Some(PublishedAlert { kind, record }))
        }
        Err(source) => {
            if let Err(release_error) = store.release(kind) {
                log::error!(
                    "alert_claim_release_failed kind={} error={}",
                    kind,
                    release_error
                );
            }
            Err(EvaluationError::Publish { kind, source })
        }
    }
}

/// Operator drill: publishes `kind`'s title unconditionally and never reads or
/// writes alert state.
pub fn simulate_alert<A: AlertPublisher>(
    publisher: &A,
    titles: &AlertTitles,
    kind: AlertKind,
) -> Result<AlertRecord, FeedError> {
    let record = publisher.publish(kind.title(titles))?;
    log::info!(
        "manual_alert_published kind={} created_at={}",
        kind,
        record.created_at.to_rfc3339()
    );
    Ok(record)
}
