pub mod card;
pub mod webhook;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use card::MessageCard;

/// Result of posting a card to a webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub status: u16,
    pub success: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub body: String,
}

/// Sink for alert cards.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `card` to `webhook_url`.
    ///
    /// A rejected delivery is reported through [`Delivery::success`]; only
    /// transport failures are errors.
    async fn send(&self, webhook_url: &str, card: &MessageCard) -> Result<Delivery>;
}

/// Logs cards instead of sending them. Used for dry runs.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, _webhook_url: &str, card: &MessageCard) -> Result<Delivery> {
        let payload = serde_json::to_string_pretty(card)?;
        info!(title = %card.title, "Dry run, notification not sent:\n{}", payload);
        Ok(Delivery {
            status: 0,
            success: true,
            body: String::new(),
        })
    }
}
