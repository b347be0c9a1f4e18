use std::path::Path;

use chrono::{DateTime, Utc};

use super::model::{AlertKind, AlertState, FlagEntry, FlagStatus, StateStoreError, is_claimable};
use super::AlertStateStore;

const FLAGS_TREE: &str = "alert_flags";

/// sled-backed flags. Every transition is a compare-and-swap on the kind's
/// key, so schedulers holding handles to one open database cannot both win a
/// claim. sled locks the directory, so a second process fails to open it
/// instead of sharing it.
#[derive(Clone)]
pub struct SledAlertStateStore {
    flags: sled::Tree,
    claim_ttl: chrono::Duration,
}

impl SledAlertStateStore {
    pub fn open(
        path: impl AsRef<Path>,
        claim_ttl: chrono::Duration,
    ) -> Result<Self, StateStoreError> {
        let db = sled::open(path)?;
        Ok(Self::from_db(&db, claim_ttl)?)
    }

    pub(crate) fn from_db(db: &sled::Db, claim_ttl: chrono::Duration) -> Result<Self, sled::Error> {
        let flags = db.open_tree(FLAGS_TREE)?;
        Ok(Self { flags, claim_ttl })
    }

    fn read_entry(
        &self,
        kind: AlertKind,
    ) -> Result<Option<(sled::IVec, FlagEntry)>, StateStoreError> {
        let Some(raw) = self.flags.get(kind.key())? else {
            return Ok(None);
        };

        match serde_json::from_slice::<FlagEntry>(&raw) {
            Ok(entry) => Ok(Some((raw, entry))),
            Err(error) => {
                // Unreadable entries count as sent.
                log::warn!(
                    "alert_state_entry_unreadable kind={} error={}",
                    kind,
                    error
                );
                Ok(Some((raw, FlagEntry::sent(Utc::now()))))
            }
        }
    }

    fn swap(
        &self,
        kind: AlertKind,
        current: Option<sled::IVec>,
        next: Option<FlagEntry>,
    ) -> Result<bool, StateStoreError> {
        let next = next.map(|entry| serde_json::to_vec(&entry)).transpose()?;
        let swapped = self.flags.compare_and_swap(kind.key(), current, next)?.is_ok();
        if swapped {
            self.flags.flush()?;
        }
        Ok(swapped)
    }
}

impl AlertStateStore for SledAlertStateStore {
    fn snapshot(&self) -> Result<AlertState, StateStoreError> {
        let mut state = AlertState::default();
        for kind in AlertKind::ALL {
            if let Some((_, entry)) = self.read_entry(kind)?
                && entry.status == FlagStatus::Sent
            {
                state.mark_sent(kind);
            }
        }
        Ok(state)
    }

    fn try_claim(&self, kind: AlertKind, now: DateTime<Utc>) -> Result<bool, StateStoreError> {
        loop {
            let current = self.read_entry(kind)?;
            if !is_claimable(current.as_ref().map(|(_, entry)| entry), now, self.claim_ttl) {
                return Ok(false);
            }

            if let Some((_, entry)) = &current {
                log::warn!(
                    "alert_state_stale_claim_taken kind={} claimed_at={}",
                    kind,
                    entry.at.to_rfc3339()
                );
            }

            let raw = current.map(|(raw, _)| raw);
            if self.swap(kind, raw, Some(FlagEntry::claimed(now)))? {
                return Ok(true);
            }
        }
    }

    fn commit(&self, kind: AlertKind, now: DateTime<Utc>) -> Result<(), StateStoreError> {
        loop {
            let current = self.read_entry(kind)?;
            if matches!(&current, Some((_, entry)) if entry.status == FlagStatus::Sent) {
                return Ok(());
            }

            let raw = current.map(|(raw, _)| raw);
            if self.swap(kind, raw, Some(FlagEntry::sent(now)))? {
                return Ok(());
            }
        }
    }

    fn release(&self, kind: AlertKind) -> Result<(), StateStoreError> {
        loop {
            let Some((raw, entry)) = self.read_entry(kind)? else {
                return Ok(());
            };
            if entry.status != FlagStatus::Claimed {
                return Ok(());
            }
            if self.swap(kind, Some(raw), None)? {
                return Ok(());
            }
        }
    }

    fn reset(&self) -> Result<(), StateStoreError> {
        self.flags.clear()?;
        self.flags.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::SledAlertStateStore;
    use crate::alert_state::{AlertKind, AlertStateStore};

    #[test]
    fn sent_flags_survive_reopen() {
        let temp = tempfile::tempdir().expect("temp dir");
        let now = Utc::now();

        {
            let store = SledAlertStateStore::open(temp.path(), Duration::seconds(120))
                .expect("open store");
            assert!(store.try_claim(AlertKind::HeavyRain, now).expect("claim"));
            store.commit(AlertKind::HeavyRain, now).expect("commit");
        }
        std::thread::sleep(std::time::Duration::from_millis(25));

        let reopened =
            SledAlertStateStore::open(temp.path(), Duration::seconds(120)).expect("reopen store");
        let state = reopened.snapshot().expect("snapshot");
        assert!(state.heavy_rain_sent);
        assert!(!state.flood_sent);
        assert!(!reopened.try_claim(AlertKind::HeavyRain, now).expect("claim after reopen"));
    }

    #[test]
    fn held_directory_cannot_be_opened_twice() {
        let temp = tempfile::tempdir().expect("temp dir");
        let _held =
            SledAlertStateStore::open(temp.path(), Duration::seconds(120)).expect("open store");

        assert!(SledAlertStateStore::open(temp.path(), Duration::seconds(120)).is_err());
    }

    #[test]
    fn two_handles_on_one_db_cannot_both_claim() {
        let temp = tempfile::tempdir().expect("temp dir");
        let db = sled::open(temp.path()).expect("open db");
        let first = SledAlertStateStore::from_db(&db, Duration::seconds(120)).expect("first");
        let second = SledAlertStateStore::from_db(&db, Duration::seconds(120)).expect("second");
        let now = Utc::now();

        assert!(first.try_claim(AlertKind::Flood, now).expect("first claim"));
        assert!(!second.try_claim(AlertKind::Flood, now).expect("second claim"));

        first.release(AlertKind::Flood).expect("release");
        assert!(second.try_claim(AlertKind::Flood, now).expect("claim after release"));
    }

    #[test]
    fn abandoned_claim_is_taken_over_after_ttl() {
        let temp = tempfile::tempdir().expect("temp dir");
        let store =
            SledAlertStateStore::open(temp.path(), Duration::seconds(60)).expect("open store");
        let start = Utc::now();

        assert!(store.try_claim(AlertKind::Flood, start).expect("claim"));
        assert!(!store
            .try_claim(AlertKind::Flood, start + Duration::seconds(59))
            .expect("claim within ttl"));
        assert!(store
            .try_claim(AlertKind::Flood, start + Duration::seconds(61))
            .expect("claim after ttl"));
    }

    #[test]
    fn reset_starts_a_new_session() {
        let temp = tempfile::tempdir().expect("temp dir");
        let store =
            SledAlertStateStore::open(temp.path(), Duration::seconds(60)).expect("open store");
        let now = Utc::now();

        store.commit(AlertKind::Flood, now).expect("commit");
        store.reset().expect("reset");

        assert!(!store.snapshot().expect("snapshot").flood_sent);
        assert!(store.try_claim(AlertKind::Flood, now).expect("claim after reset"));
    }
}
