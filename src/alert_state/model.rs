use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AlertTitles;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    HeavyRain,
    Flood,
}

impl AlertKind {
    pub const ALL: [AlertKind; 2] = [AlertKind::HeavyRain, AlertKind::Flood];

    pub(crate) fn key(self) -> &'static str {
        match self {
            AlertKind::HeavyRain => "heavy_rain",
            AlertKind::Flood => "flood",
        }
    }

    pub fn title(self, titles: &AlertTitles) -> &str {
        match self {
            AlertKind::HeavyRain => &titles.heavy_rain,
            AlertKind::Flood => &titles.flood,
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Which alerts the current session has already published.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertState {
    pub heavy_rain_sent: bool,
    pub flood_sent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum AlertPhase {
    Nominal,
    HeavyRainWarned,
    FloodWarned,
}

impl AlertState {
    pub fn is_sent(&self, kind: AlertKind) -> bool {
        match kind {
            AlertKind::HeavyRain => self.heavy_rain_sent,
            AlertKind::Flood => self.flood_sent,
        }
    }

    pub(crate) fn mark_sent(&mut self, kind: AlertKind) {
        match kind {
            AlertKind::HeavyRain => self.heavy_rain_sent = true,
            AlertKind::Flood => self.flood_sent = true,
        }
    }

    /// Highest severity published so far this session.
    pub fn phase(&self) -> AlertPhase {
        if self.flood_sent {
            AlertPhase::FloodWarned
        } else if self.heavy_rain_sent {
            AlertPhase::HeavyRainWarned
        } else {
            AlertPhase::Nominal
        }
    }
}

#[derive(Debug, Error)]
pub enum StateStoreError {
    #[error("alert state store failed: {0}")]
    Sled(#[from] sled::Error),
    #[error("alert state entry could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(super) enum FlagStatus {
    Claimed,
    Sent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct FlagEntry {
    pub(super) status: FlagStatus,
    pub(super) at: DateTime<Utc>,
}

impl FlagEntry {
    pub(super) fn claimed(at: DateTime<Utc>) -> Self {
        Self {
            status: FlagStatus::Claimed,
            at,
        }
    }

    pub(super) fn sent(at: DateTime<Utc>) -> Self {
        Self {
            status: FlagStatus::Sent,
            at,
        }
    }
}

/// A kind can be claimed when nothing is recorded for it or when a previous
/// claim has outlived `claim_ttl` without being committed.
pub(super) fn is_claimable(
    entry: Option<&FlagEntry>,
    now: DateTime<Utc>,
    claim_ttl: chrono::Duration,
) -> bool {
    match entry {
        None => true,
        Some(FlagEntry {
            status: FlagStatus::Sent,
            ..
        }) => false,
        Some(FlagEntry {
            status: FlagStatus::Claimed,
            at,
        }) => now.signed_duration_since(*at) >= claim_ttl,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{AlertKind, AlertPhase, AlertState, FlagEntry, is_claimable};

    #[test]
    fn phase_follows_highest_sent_flag() {
        let mut state = AlertState::default();
        assert_eq!(state.phase(), AlertPhase::Nominal);

        state.mark_sent(AlertKind::HeavyRain);
        assert_eq!(state.phase(), AlertPhase::HeavyRainWarned);

        state.mark_sent(AlertKind::Flood);
        assert_eq!(state.phase(), AlertPhase::FloodWarned);
        assert!(state.is_sent(AlertKind::HeavyRain));
    }

    #[test]
    fn claims_expire_after_ttl_but_sent_flags_never_do() {
        let start = Utc.with_ymd_and_hms(2024, 7, 21, 10, 0, 0).unwrap();
        let ttl = Duration::seconds(120);

        let claimed = FlagEntry::claimed(start);
        assert!(!is_claimable(Some(&claimed), start + Duration::seconds(30), ttl));
        assert!(is_claimable(Some(&claimed), start + Duration::seconds(120), ttl));

        let sent = FlagEntry::sent(start);
        assert!(!is_claimable(Some(&sent), start + Duration::days(365), ttl));
        assert!(is_claimable(None, start, ttl));
    }
}
