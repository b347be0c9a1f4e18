mod model;
mod write;

pub use model::{AlertRecord, FeedError};
pub use write::{AlertPublisher, JsonlAlertFeed};

#[cfg(test)]
pub(crate) use write::RecordingPublisher;
