use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serde::Serialize;

/// Account and region shown on alert cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallerIdentity {
    pub account_id: String,
    pub region: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self) -> Result<CallerIdentity>;
}

/// Fixed identity, for local runs and tests.
pub struct StaticIdentity(pub CallerIdentity);

impl StaticIdentity {
    pub fn new(account_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self(CallerIdentity {
            account_id: account_id.into(),
            region: region.into(),
        })
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn resolve(&self) -> Result<CallerIdentity> {
        Ok(self.0.clone())
    }
}

/// Asks STS who the running credentials belong to.
pub struct StsIdentity {
    client: aws_sdk_sts::Client,
    region: String,
}

impl StsIdentity {
    /// Fails when no region is configured, since cards and console links need one.
    pub fn from_sdk_config(config: &aws_config::SdkConfig) -> Result<Self> {
        let region = config
            .region()
            .map(|r| r.to_string())
            .ok_or_else(|| anyhow::anyhow!("AWS region is not configured; set AWS_REGION or --region"))?;
        Ok(Self {
            client: aws_sdk_sts::Client::new(config),
            region,
        })
    }
}

#[async_trait]
impl IdentityProvider for StsIdentity {
    async fn resolve(&self) -> Result<CallerIdentity> {
        let output = self
            .client
            .get_caller_identity()
            .send()
            .await
            .context("STS GetCallerIdentity failed")?;

        let account_id = output
            .account()
            .ok_or_else(|| anyhow::anyhow!("STS GetCallerIdentity returned no account"))?;

        Ok(CallerIdentity {
            account_id: account_id.to_string(),
            region: self.region.clone(),
        })
    }
}
