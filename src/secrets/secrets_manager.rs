use async_trait::async_trait;
use aws_sdk_secretsmanager::Client;
use aws_smithy_types::error::display::DisplayErrorContext;

use crate::error::SecretError;
use crate::secrets::{SecretSource, parse_webhook_secret};

/// Reads the webhook URL from an AWS Secrets Manager secret on every call,
/// so rotations take effect on the next invocation.
pub struct SecretsManagerSource {
    client: Client,
    secret_id: String,
}

impl SecretsManagerSource {
    pub fn new(client: Client, secret_id: impl Into<String>) -> Self {
        Self {
            client,
            secret_id: secret_id.into(),
        }
    }

    pub fn from_sdk_config(config: &aws_config::SdkConfig, secret_id: impl Into<String>) -> Self {
        Self::new(Client::new(config), secret_id)
    }
}

#[async_trait]
impl SecretSource for SecretsManagerSource {
    async fn webhook_url(&self) -> Result<String, SecretError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(&self.secret_id)
            .send()
            .await
            .map_err(|e| SecretError::Retrieval {
                name: self.secret_id.clone(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let secret_string = output.secret_string().ok_or_else(|| SecretError::Empty {
            name: self.secret_id.clone(),
        })?;

        parse_webhook_secret(&self.secret_id, secret_string)
    }
}
