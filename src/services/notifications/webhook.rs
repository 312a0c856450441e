use anyhow::Context;
use async_trait::async_trait;

use super::{BookingEvent, Notifier};

/// POSTs each event as JSON to a configured URL.
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, event: &BookingEvent) -> anyhow::Result<()> {
        self.client
            .post(&self.url)
            .json(event)
            .send()
            .await
            .context("failed to send notification webhook")?
            .error_for_status()
            .context("notification webhook returned error")?;

        tracing::debug!(event = event.event.as_str(), booking_id = %event.booking_id, "webhook delivered");
        Ok(())
    }
}
