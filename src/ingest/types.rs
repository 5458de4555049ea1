// src/ingest/types.rs
use serde::{Deserialize, Serialize};

use crate::config::MonitoredSource;
use crate::error::FetchError;

/// The single most recent entry of a source.
///
/// Two items are the same event iff their titles are byte-identical.
/// A link-only change is not a new event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LatestItem {
    pub title: String,
    pub link: String,
}

impl LatestItem {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
        }
    }
}

#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Fetch the first item in the source's natural order.
    async fn fetch_latest(&self, source: &MonitoredSource) -> Result<LatestItem, FetchError>;
    fn name(&self) -> &'static str;
}
