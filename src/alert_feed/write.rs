use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use file_rotate::{ContentLimit, FileRotate, compression::Compression, suffix::AppendCount};

use crate::config::Config;

use super::model::{AlertRecord, FeedError};

/// Append-only sink for published alerts. Implementations do not deduplicate.
pub trait AlertPublisher {
    fn publish(&self, title: &str) -> Result<AlertRecord, FeedError>;
}

/// JSON-lines feed on disk, rotated by size. Subscribers tail the file.
pub struct JsonlAlertFeed {
    path: PathBuf,
    max_file_size_bytes: u64,
    retained_files: u16,
    write_lock: Mutex<()>,
}

impl JsonlAlertFeed {
    pub fn new(path: impl Into<PathBuf>, max_file_size_bytes: u64, retained_files: u16) -> Self {
        Self {
            path: path.into(),
            max_file_size_bytes,
            retained_files,
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.alert_feed.path,
            config.alert_feed.max_file_size_bytes,
            config.alert_feed.retained_files,
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AlertPublisher for JsonlAlertFeed {
    fn publish(&self, title: &str) -> Result<AlertRecord, FeedError> {
        let record = AlertRecord {
            title: title.to_string(),
            created_at: Utc::now(),
        };
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        // A poisoned lock only means another append panicked; the file itself is intact.
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        append_with_rotation(
            &self.path,
            &line,
            self.max_file_size_bytes,
            self.retained_files,
        )?;

        log::info!(
            "alert_feed_appended path={} title={:?}",
            self.path.display(),
            record.title
        );
        Ok(record)
    }
}

fn append_with_rotation(
    path: &Path,
    line: &[u8],
    max_file_size_bytes: u64,
    retained_files: u16,
) -> Result<(), std::io::Error> {
    let max_bytes = usize::try_from(max_file_size_bytes).unwrap_or(usize::MAX);
    let mut writer = FileRotate::new(
        path,
        AppendCount::new(retained_files as usize),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        None,
    );

    writer.write_all(line)?;
    writer.flush()?;
    Ok(())
}

/// In-memory publisher that can be told to fail its next N publishes.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingPublisher {
    records: Mutex<Vec<AlertRecord>>,
    failures_remaining: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl RecordingPublisher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing(times: usize) -> Self {
        let publisher = Self::default();
        publisher
            .failures_remaining
            .store(times, std::sync::atomic::Ordering::SeqCst);
        publisher
    }

    pub(crate) fn titles(&self) -> Vec<String> {
        self.records
            .lock()
            .expect("records lock")
            .iter()
            .map(|record| record.title.clone())
            .collect()
    }
}

#[cfg(test)]
impl AlertPublisher for RecordingPublisher {
    fn publish(&self, title: &str) -> Result<AlertRecord, FeedError> {
        use std::sync::atomic::Ordering;

        if self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
        {
            return Err(FeedError::Io(std::io::Error::other("feed offline")));
        }

        let record = AlertRecord {
            title: title.to_string(),
            created_at: Utc::now(),
        };
        self.records
            .lock()
            .expect("records lock")
            .push(record.clone());
        Ok(record)
    }
}
