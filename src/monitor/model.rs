use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::alert_feed::AlertRecord;
use crate::alert_state::AlertKind;
use crate::points::MonitoredPoint;
use crate::weather::PointReading;

use super::severity::SeverityBand;

/// City-wide reduction of one cycle's readings.
///
/// `max_precipitation_mm` is the largest successful reading (0 when none
/// succeeded). The probability belongs to that same reading and is not
/// maximized on its own. Ties keep the first point in configured order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSample {
    pub max_precipitation_mm: f64,
    pub max_precipitation_probability_pct: u8,
    pub sample_count: usize,
    pub cycle_timestamp: DateTime<Utc>,
    pub peak_point: Option<MonitoredPoint>,
}

impl AggregateSample {
    pub fn empty(cycle_timestamp: DateTime<Utc>) -> Self {
        Self {
            max_precipitation_mm: 0.0,
            max_precipitation_probability_pct: 0,
            sample_count: 0,
            cycle_timestamp,
            peak_point: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PublishedAlert {
    pub kind: AlertKind,
    pub record: AlertRecord,
}

/// Everything one cycle observed and did.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub sample: AggregateSample,
    pub readings: Vec<PointReading>,
    pub failed_points: usize,
    pub band: SeverityBand,
    pub alert: Option<PublishedAlert>,
}

impl CycleReport {
    /// Points with any rain this hour, in configured order.
    pub fn raining_points(&self) -> impl Iterator<Item = &PointReading> {
        self.readings
            .iter()
            .filter(|reading| reading.precipitation_mm > 0.0)
    }
}
