use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use aws_config::SdkConfig;
use clap::Args;
use tracing::info;

use crate::aws::{AwsOptions, load_sdk_config};
use crate::cli::config::PipewatchConfig;
use crate::engine::{NotificationRelay, RelaySettings};
use crate::identity::{IdentityProvider, StaticIdentity, StsIdentity};
use crate::notify::card::CardLanguage;
use crate::notify::webhook::{DEFAULT_TIMEOUT_S, WebhookNotifier};
use crate::notify::{LogNotifier, Notifier};
use crate::secrets::secrets_manager::SecretsManagerSource;
use crate::secrets::{SecretSource, StaticSecret};
use crate::storage::StateStore;
use crate::storage::dynamo_store::DynamoStateStore;
use crate::storage::json_store::JsonStateStore;

/// Flags shared by every command that touches the relay or its store.
#[derive(Args, Debug, Clone, Default)]
pub struct RelayArgs {
    /// DynamoDB table holding pipeline state records
    #[arg(long, env = "DYNAMODB_TABLE")]
    pub table: Option<String>,

    /// Keep state records as JSON files in this directory instead of DynamoDB
    #[arg(long, env = "PIPEWATCH_STORE_DIR")]
    pub store_dir: Option<PathBuf>,

    /// Secrets Manager secret holding {"WEBHOOK_URL": ...}
    #[arg(long, env = "WEBHOOK_SECRET_NAME")]
    pub secret_name: Option<String>,

    /// Webhook URL to use directly, bypassing Secrets Manager
    #[arg(long, env = "WEBHOOK_URL", hide_env_values = true)]
    pub webhook_url: Option<String>,

    /// AWS region
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Alternate AWS endpoint (e.g. LocalStack)
    #[arg(long, env = "AWS_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// AWS account ID shown on cards; skips the STS lookup
    #[arg(long, env = "PIPEWATCH_ACCOUNT_ID")]
    pub account_id: Option<String>,

    /// Hours from UTC for timestamps (default: -3)
    #[arg(long, env = "PIPEWATCH_UTC_OFFSET", allow_hyphen_values = true)]
    pub utc_offset: Option<i32>,

    /// strftime pattern for timestamps (default: %d-%m-%Y %H:%M:%S)
    #[arg(long, env = "PIPEWATCH_TIME_FORMAT")]
    pub time_format: Option<String>,

    /// Card label language
    #[arg(long, env = "PIPEWATCH_LANGUAGE", value_enum)]
    pub language: Option<CardLanguage>,

    /// Webhook request timeout in seconds (default: 30)
    #[arg(long, env = "PIPEWATCH_TIMEOUT")]
    pub timeout: Option<f64>,
}

/// Relay configuration after merging flags, env and the YAML file.
#[derive(Debug, Clone)]
pub struct RelayOptions {
    pub table: Option<String>,
    pub store_dir: Option<PathBuf>,
    pub secret_name: Option<String>,
    pub webhook_url: Option<String>,
    pub account_id: Option<String>,
    pub aws: AwsOptions,
    pub settings: RelaySettings,
    pub timeout: Duration,
}

impl RelayOptions {
    /// Flags and env win over the config file; the config file wins over defaults.
    pub fn resolve(args: RelayArgs, config: &PipewatchConfig) -> Result<Self> {
        let defaults = RelaySettings::default();
        let settings = RelaySettings {
            utc_offset_hours: args
                .utc_offset
                .or(config.utc_offset_hours)
                .unwrap_or(defaults.utc_offset_hours),
            time_format: args
                .time_format
                .or_else(|| config.time_format.clone())
                .unwrap_or(defaults.time_format),
            language: args.language.or(config.language).unwrap_or(defaults.language),
            console_url: config.console_url.clone().unwrap_or(defaults.console_url),
        };
        // Surface a bad offset or format at startup rather than on the first event.
        settings.local_time(chrono::Utc::now())?;

        let timeout_s = args.timeout.or(config.timeout_s).unwrap_or(DEFAULT_TIMEOUT_S);
        if !timeout_s.is_finite() || timeout_s <= 0.0 {
            anyhow::bail!("Webhook timeout must be a positive number of seconds, got {}", timeout_s);
        }

        Ok(Self {
            table: args.table.or_else(|| config.table.clone()),
            store_dir: args
                .store_dir
                .or_else(|| config.store_dir.as_ref().map(PathBuf::from)),
            secret_name: args.secret_name.or_else(|| config.secret_name.clone()),
            webhook_url: args.webhook_url.or_else(|| config.webhook_url.clone()),
            account_id: args.account_id.or_else(|| config.account_id.clone()),
            aws: AwsOptions {
                region: args.region.or_else(|| config.region.clone()),
                endpoint_url: args.endpoint_url.or_else(|| config.endpoint_url.clone()),
            },
            settings,
            timeout: Duration::from_secs_f64(timeout_s),
        })
    }

    fn store_needs_aws(&self) -> bool {
        self.store_dir.is_none()
    }

    fn relay_needs_aws(&self) -> bool {
        self.store_needs_aws()
            || self.webhook_url.is_none()
            || self.account_id.is_none()
            || self.aws.region.is_none()
    }

    async fn sdk_config_if(&self, needed: bool) -> Option<SdkConfig> {
        if needed {
            Some(load_sdk_config(&self.aws).await)
        } else {
            None
        }
    }

    fn build_store(&self, sdk: Option<&SdkConfig>) -> Result<Arc<dyn StateStore>> {
        if let Some(dir) = &self.store_dir {
            info!(dir = %dir.display(), "Using JSON file state store");
            return Ok(Arc::new(JsonStateStore::new(dir)));
        }
        let table = self.table.as_deref().ok_or_else(|| {
            anyhow::anyhow!("A state store is required: set --table/DYNAMODB_TABLE or --store-dir")
        })?;
        let sdk = require_sdk(sdk)?;
        info!(table = %table, "Using DynamoDB state store");
        Ok(Arc::new(DynamoStateStore::from_sdk_config(sdk, table)))
    }

    fn build_secrets(&self, sdk: Option<&SdkConfig>, dry_run: bool) -> Result<Arc<dyn SecretSource>> {
        if let Some(url) = &self.webhook_url {
            return Ok(Arc::new(StaticSecret::new(url.clone())));
        }
        match &self.secret_name {
            Some(name) => Ok(Arc::new(SecretsManagerSource::from_sdk_config(
                require_sdk(sdk)?,
                name.clone(),
            ))),
            None if dry_run => Ok(Arc::new(StaticSecret::new("dry-run://webhook"))),
            None => anyhow::bail!(
                "A webhook is required: set --secret-name/WEBHOOK_SECRET_NAME or --webhook-url"
            ),
        }
    }

    fn build_identity(&self, sdk: Option<&SdkConfig>) -> Result<Arc<dyn IdentityProvider>> {
        match (&self.account_id, &self.aws.region) {
            (Some(account), Some(region)) => {
                Ok(Arc::new(StaticIdentity::new(account.clone(), region.clone())))
            }
            _ => Ok(Arc::new(StsIdentity::from_sdk_config(require_sdk(sdk)?)?)),
        }
    }

    /// Build just the state store, for commands that only read records.
    pub async fn store(&self) -> Result<Arc<dyn StateStore>> {
        let sdk = self.sdk_config_if(self.store_needs_aws()).await;
        self.build_store(sdk.as_ref())
    }

    /// Wire the relay: AWS is only touched for the parts not given statically.
    pub async fn relay(&self, dry_run: bool) -> Result<NotificationRelay> {
        let sdk = self.sdk_config_if(self.relay_needs_aws()).await;

        let store = self.build_store(sdk.as_ref())?;
        let secrets = self.build_secrets(sdk.as_ref(), dry_run)?;
        let identity = self.build_identity(sdk.as_ref())?;
        let notifier: Arc<dyn Notifier> = if dry_run {
            Arc::new(LogNotifier)
        } else {
            Arc::new(WebhookNotifier::new(self.timeout)?)
        };

        Ok(NotificationRelay::new(store, secrets, identity, notifier)
            .with_settings(self.settings.clone()))
    }
}

fn require_sdk(sdk: Option<&SdkConfig>) -> Result<&SdkConfig> {
    sdk.ok_or_else(|| anyhow::anyhow!("AWS configuration was not loaded"))
}
