use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use super::{Announcement, Notifier};
use crate::error::DeliveryError;

/// Posts announcements to Discord channel webhooks.
#[derive(Clone)]
pub struct DiscordNotifier {
    client: Client,
    timeout: Duration,
}

impl DiscordNotifier {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

#[async_trait::async_trait]
impl Notifier for DiscordNotifier {
    async fn send(
        &self,
        destination: &str,
        announcement: &Announcement,
    ) -> Result<(), DeliveryError> {
        let payload = DiscordWebhookPayload::everyone(announcement.render());

        let rsp = self
            .client
            .post(destination)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?;

        let status = rsp.status();
        if !status.is_success() {
            return Err(DeliveryError::Status(status.as_u16()));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct AllowedMentions {
    parse: Vec<&'static str>,
}

#[derive(Serialize)]
struct DiscordWebhookPayload {
    content: String,
    allowed_mentions: AllowedMentions,
}

impl DiscordWebhookPayload {
    fn everyone(content: String) -> Self {
        Self {
            content,
            allowed_mentions: AllowedMentions {
                parse: vec!["everyone"],
            },
        }
    }
}
