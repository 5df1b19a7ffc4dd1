use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::{error, info, warn};

use crate::notify::card::MessageCard;
use crate::notify::{Delivery, Notifier};

pub const DEFAULT_TIMEOUT_S: f64 = 30.0;

/// Posts cards to an incoming-webhook URL.
pub struct WebhookNotifier {
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, webhook_url: &str, card: &MessageCard) -> Result<Delivery> {
        // The URL embeds the webhook credential; keep it out of errors.
        let response = self
            .client
            .post(webhook_url)
            .header(CONTENT_TYPE, "application/json")
            .json(card)
            .send()
            .await
            .map_err(|e| e.without_url())?;

        let status = response.status().as_u16();
        let success = matches!(status, 200 | 204);
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(status = status, error = %e.without_url(), "Failed to read webhook response body");
                String::new()
            }
        };

        if success {
            info!(status = status, "Notification sent");
        } else {
            error!(status = status, body = %body, "Webhook rejected notification");
        }

        Ok(Delivery {
            status,
            success,
            body,
        })
    }
}
