use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One line of the alert feed. Never rewritten once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("alert feed unavailable: {0}")]
    Io(#[from] std::io::Error),
    #[error("alert record could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}
