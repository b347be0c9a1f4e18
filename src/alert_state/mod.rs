mod memory;
mod model;
mod sled_store;

pub use memory::MemoryAlertStateStore;
pub use model::{AlertKind, AlertPhase, AlertState, StateStoreError};
pub use sled_store::SledAlertStateStore;

use chrono::{DateTime, Utc};

use crate::config::{AlertStateBackend, Config, MAX_CLAIM_TTL_SECS};

/// Durable home of the one-shot alert flags.
///
/// Setting a flag is a three step protocol so that several schedulers sharing
/// one store within a process publish each kind at most once: `try_claim` (absent -> claimed),
/// publish, then `commit` (claimed -> sent) or `release` (claimed -> absent).
/// A claim older than the store's claim TTL is treated as abandoned.
pub trait AlertStateStore {
    fn snapshot(&self) -> Result<AlertState, StateStoreError>;
    fn try_claim(&self, kind: AlertKind, now: DateTime<Utc>) -> Result<bool, StateStoreError>;
    fn commit(&self, kind: AlertKind, now: DateTime<Utc>) -> Result<(), StateStoreError>;
    fn release(&self, kind: AlertKind) -> Result<(), StateStoreError>;
    fn reset(&self) -> Result<(), StateStoreError>;
}

pub enum ActiveAlertStateStore {
    Memory(MemoryAlertStateStore),
    Sled(SledAlertStateStore),
}

impl ActiveAlertStateStore {
    pub fn open_from_config(config: &Config) -> Result<Self, StateStoreError> {
        // Validation caps the TTL well inside chrono's range.
        let claim_ttl = i64::try_from(config.alert_state.claim_ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or_else(|| chrono::Duration::seconds(MAX_CLAIM_TTL_SECS as i64));
        match config.alert_state.backend {
            AlertStateBackend::Memory => Ok(Self::Memory(MemoryAlertStateStore::new(claim_ttl))),
            AlertStateBackend::Sled => Ok(Self::Sled(SledAlertStateStore::open(
                &config.alert_state.path,
                claim_ttl,
            )?)),
        }
    }
}

impl AlertStateStore for ActiveAlertStateStore {
    fn snapshot(&self) -> Result<AlertState, StateStoreError> {
        match self {
            ActiveAlertStateStore::Memory(store) => store.snapshot(),
            ActiveAlertStateStore::Sled(store) => store.snapshot(),
        }
    }

    fn try_claim(&self, kind: AlertKind, now: DateTime<Utc>) -> Result<bool, StateStoreError> {
        match self {
            ActiveAlertStateStore::Memory(store) => store.try_claim(kind, now),
            ActiveAlertStateStore::Sled(store) => store.try_claim(kind, now),
        }
    }

    fn commit(&self, kind: AlertKind, now: DateTime<Utc>) -> Result<(), StateStoreError> {
        match self {
            ActiveAlertStateStore::Memory(store) => store.commit(kind, now),
            ActiveAlertStateStore::Sled(store) => store.commit(kind, now),
        }
    }

    fn release(&self, kind: AlertKind) -> Result<(), StateStoreError> {
        match self {
            ActiveAlertStateStore::Memory(store) => store.release(kind),
            ActiveAlertStateStore::Sled(store) => store.release(kind),
        }
    }

    fn reset(&self) -> Result<(), StateStoreError> {
        match self {
            ActiveAlertStateStore::Memory(store) => store.reset(),
            ActiveAlertStateStore::Sled(store) => store.reset(),
        }
    }
}
