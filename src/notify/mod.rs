// src/notify/mod.rs
pub mod discord;

use crate::config::MonitoredSource;
use crate::error::DeliveryError;
use crate::ingest::types::LatestItem;

pub use discord::DiscordNotifier;

/// Mention that pings the whole channel, spoiler-wrapped so it stays quiet visually.
pub const ATTENTION_MARKER: &str = "||@everyone||";

/// One outbound "new item" message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub heading: String,
    pub title: String,
    pub link: String,
}

impl Announcement {
    pub fn for_item(source: &MonitoredSource, item: &LatestItem) -> Self {
        Self {
            heading: source.label().to_string(),
            title: item.title.clone(),
            link: item.link.clone(),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "{ATTENTION_MARKER} \n📰 **New {}!**\n**{}**\n{}",
            self.heading, self.title, self.link
        )
    }
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver once; no retries.
    async fn send(&self, destination: &str, announcement: &Announcement)
        -> Result<(), DeliveryError>;
}
