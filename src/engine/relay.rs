use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use chrono::{DateTime, FixedOffset, Utc};
use tracing::{error, info};

use crate::engine::types::*;
use crate::identity::{CallerIdentity, IdentityProvider};
use crate::notify::Notifier;
use crate::notify::card::{CardDetails, CardLanguage, build_card, pipeline_console_url};
use crate::secrets::SecretSource;
use crate::storage::StateStore;

pub const DEFAULT_UTC_OFFSET_HOURS: i32 = -3;
pub const DEFAULT_TIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S";
pub const DEFAULT_CONSOLE_URL: &str = "https://console.aws.amazon.com";

/// Compare the reported state with the last stored one.
///
/// Every FAILED state alerts, including repeats. A SUCCEEDED state alerts
/// only when it follows a stored FAILED state.
pub fn decide(current: &PipelineState, last: Option<&PipelineState>) -> Decision {
    match (current, last) {
        (PipelineState::Failed, _) => Decision::Notify(AlertKind::Failure),
        (PipelineState::Succeeded, Some(PipelineState::Failed)) => {
            Decision::Notify(AlertKind::Recovery)
        }
        _ => Decision::Skip,
    }
}

/// Presentation settings for alerts.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    /// Fixed offset applied to the timestamp shown in cards and stored records.
    pub utc_offset_hours: i32,
    /// `strftime` pattern for that timestamp.
    pub time_format: String,
    pub language: CardLanguage,
    /// Base URL of the AWS console used for the "view pipeline" action.
    pub console_url: String,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            language: CardLanguage::default(),
            console_url: DEFAULT_CONSOLE_URL.to_string(),
        }
    }
}

impl RelaySettings {
    /// Render `now` in the configured offset and format.
    pub fn local_time(&self, now: DateTime<Utc>) -> Result<String> {
        let offset = FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| {
            anyhow::anyhow!("UTC offset of {} hours is out of range", self.utc_offset_hours)
        })?;

        let mut formatted = String::new();
        write!(formatted, "{}", now.with_timezone(&offset).format(&self.time_format))
            .map_err(|_| anyhow::anyhow!("Invalid time format: '{}'", self.time_format))?;
        Ok(formatted)
    }
}

/// Turns pipeline state-change notifications into deduplicated webhook alerts.
pub struct NotificationRelay {
    store: Arc<dyn StateStore>,
    secrets: Arc<dyn SecretSource>,
    identity: Arc<dyn IdentityProvider>,
    notifier: Arc<dyn Notifier>,
    settings: RelaySettings,
}

impl NotificationRelay {
    pub fn new(
        store: Arc<dyn StateStore>,
        secrets: Arc<dyn SecretSource>,
        identity: Arc<dyn IdentityProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            secrets,
            identity,
            notifier,
            settings: RelaySettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: RelaySettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// Process one inbound batch using the current time.
    pub async fn handle_batch(&self, event: &SnsEvent) -> Result<BatchReport> {
        self.handle_batch_at(event, Utc::now()).await
    }

    /// Process one inbound batch as if it arrived at `now`.
    ///
    /// Records are handled in order. The first malformed record aborts the
    /// batch; records before it keep their effects.
    pub async fn handle_batch_at(&self, event: &SnsEvent, now: DateTime<Utc>) -> Result<BatchReport> {
        let webhook_url = match self.secrets.webhook_url().await {
            Ok(url) => url,
            Err(e) => {
                error!(error = %e, "Failed to retrieve webhook URL");
                return Err(e.into());
            }
        };

        let identity = self
            .identity
            .resolve()
            .await
            .context("Failed to resolve AWS caller identity")?;
        let executed_at = self.settings.local_time(now)?;

        let mut report = BatchReport::default();
        for (index, record) in event.records.iter().enumerate() {
            let pipeline_event = PipelineEvent::from_message(index, &record.sns.message)?;
            let outcome = self
                .process(pipeline_event.detail, &identity, &webhook_url, &executed_at)
                .await?;
            report.outcomes.push(outcome);
        }

        info!(
            records = report.outcomes.len(),
            notified = report.notified(),
            "Event processed successfully"
        );
        Ok(report)
    }

    async fn process(
        &self,
        detail: PipelineEventDetail,
        identity: &CallerIdentity,
        webhook_url: &str,
        executed_at: &str,
    ) -> Result<RecordOutcome> {
        let PipelineEventDetail { pipeline, state, .. } = detail;

        let previous = self
            .store
            .get_record(&pipeline)
            .await
            .with_context(|| format!("Failed to read state for pipeline '{}'", pipeline))?
            .map(|record| record.state);

        let decision = decide(&state, previous.as_ref());
        let Some(kind) = decision.alert() else {
            info!(
                pipeline = %pipeline,
                state = %state,
                previous = previous.as_ref().map(|s| s.as_str()).unwrap_or("UNKNOWN"),
                "No state update needed"
            );
            return Ok(RecordOutcome {
                pipeline,
                state,
                previous,
                decision,
                delivery: None,
            });
        };

        info!(pipeline = %pipeline, state = %state, "Updating pipeline state record");
        self.store
            .put_record(&PipelineRecord {
                pipeline_name: pipeline.clone(),
                state: state.clone(),
                last_update_time: executed_at.to_string(),
            })
            .await
            .with_context(|| format!("Failed to write state for pipeline '{}'", pipeline))?;

        let pipeline_url =
            pipeline_console_url(&self.settings.console_url, &pipeline, &identity.region);
        let card = build_card(
            kind,
            &CardDetails {
                pipeline: &pipeline,
                state: &state,
                executed_at,
                account_id: &identity.account_id,
                region: &identity.region,
                pipeline_url: &pipeline_url,
            },
            self.settings.language,
        );

        let delivery = self
            .notifier
            .send(webhook_url, &card)
            .await
            .with_context(|| format!("Failed to notify for pipeline '{}'", pipeline))?;

        Ok(RecordOutcome {
            pipeline,
            state,
            previous,
            decision,
            delivery: Some(delivery),
        })
    }
}
