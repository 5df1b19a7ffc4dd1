pub mod secrets_manager;

use async_trait::async_trait;

use crate::error::SecretError;

/// Key inside the secret's JSON document that holds the webhook URL.
pub const WEBHOOK_URL_KEY: &str = "WEBHOOK_URL";

/// Where the relay gets the chat webhook URL from.
#[async_trait]
pub trait SecretSource: Send + Sync {
    async fn webhook_url(&self) -> Result<String, SecretError>;
}

/// A webhook URL given directly on the command line or in config.
pub struct StaticSecret {
    url: String,
}

impl StaticSecret {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl SecretSource for StaticSecret {
    async fn webhook_url(&self) -> Result<String, SecretError> {
        Ok(self.url.clone())
    }
}

/// Extract the webhook URL from a secret string of the form
/// `{"WEBHOOK_URL": "https://..."}`.
pub fn parse_webhook_secret(name: &str, secret_string: &str) -> Result<String, SecretError> {
    let doc: serde_json::Value =
        serde_json::from_str(secret_string).map_err(|source| SecretError::NotJson {
            name: name.to_string(),
            source,
        })?;

    doc.get(WEBHOOK_URL_KEY)
        .and_then(|value| value.as_str())
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SecretError::MissingKey {
            name: name.to_string(),
            key: WEBHOOK_URL_KEY,
        })
}
