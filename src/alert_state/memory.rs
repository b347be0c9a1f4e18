use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::model::{AlertKind, AlertState, FlagEntry, FlagStatus, StateStoreError, is_claimable};
use super::AlertStateStore;

/// Process-local flags; a restart starts a new session.
pub struct MemoryAlertStateStore {
    entries: Mutex<HashMap<AlertKind, FlagEntry>>,
    claim_ttl: chrono::Duration,
}

impl MemoryAlertStateStore {
    pub fn new(claim_ttl: chrono::Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            claim_ttl,
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<AlertKind, FlagEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AlertStateStore for MemoryAlertStateStore {
    fn snapshot(&self) -> Result<AlertState, StateStoreError> {
        let entries = self.entries();
        let mut state = AlertState::default();
        for kind in AlertKind::ALL {
            if matches!(entries.get(&kind), Some(entry) if entry.status == FlagStatus::Sent) {
                state.mark_sent(kind);
            }
        }
        Ok(state)
    }

    fn try_claim(&self, kind: AlertKind, now: DateTime<Utc>) -> Result<bool, StateStoreError> {
        let mut entries = self.entries();
        if !is_claimable(entries.get(&kind), now, self.claim_ttl) {
            return Ok(false);
        }
        entries.insert(kind, FlagEntry::claimed(now));
        Ok(true)
    }

    fn commit(&self, kind: AlertKind, now: DateTime<Utc>) -> Result<(), StateStoreError> {
        self.entries().insert(kind, FlagEntry::sent(now));
        Ok(())
    }

    fn release(&self, kind: AlertKind) -> Result<(), StateStoreError> {
        let mut entries = self.entries();
        if matches!(entries.get(&kind), Some(entry) if entry.status == FlagStatus::Claimed) {
            entries.remove(&kind);
        }
        Ok(())
    }

    fn reset(&self) -> Result<(), StateStoreError> {
        self.entries().clear();
        Ok(())
    }
}
