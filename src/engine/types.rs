use serde::{Deserialize, Serialize};

use crate::error::EventError;
use crate::notify::Delivery;

/// Execution state reported by CodePipeline.
///
/// Unrecognised values are kept verbatim so they round-trip through the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PipelineState {
    Started,
    Succeeded,
    Failed,
    Stopped,
    Stopping,
    Superseded,
    Resumed,
    Canceled,
    Other(String),
}

impl PipelineState {
    pub fn as_str(&self) -> &str {
        match self {
            PipelineState::Started => "STARTED",
            PipelineState::Succeeded => "SUCCEEDED",
            PipelineState::Failed => "FAILED",
            PipelineState::Stopped => "STOPPED",
            PipelineState::Stopping => "STOPPING",
            PipelineState::Superseded => "SUPERSEDED",
            PipelineState::Resumed => "RESUMED",
            PipelineState::Canceled => "CANCELED",
            PipelineState::Other(s) => s,
        }
    }
}

impl From<String> for PipelineState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "STARTED" => PipelineState::Started,
            "SUCCEEDED" => PipelineState::Succeeded,
            "FAILED" => PipelineState::Failed,
            "STOPPED" => PipelineState::Stopped,
            "STOPPING" => PipelineState::Stopping,
            "SUPERSEDED" => PipelineState::Superseded,
            "RESUMED" => PipelineState::Resumed,
            "CANCELED" => PipelineState::Canceled,
            _ => PipelineState::Other(value),
        }
    }
}

impl From<&str> for PipelineState {
    fn from(value: &str) -> Self {
        PipelineState::from(value.to_string())
    }
}

impl From<PipelineState> for String {
    fn from(state: PipelineState) -> Self {
        state.as_str().to_string()
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Last-known state of one pipeline, keyed by `pipelineName`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRecord {
    pub pipeline_name: String,
    pub state: PipelineState,
    pub last_update_time: String,
}

/// Batch delivered by the SNS trigger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SnsEvent {
    #[serde(default)]
    pub records: Vec<SnsEventRecord>,
}

impl SnsEvent {
    /// Wrap a single raw SNS message body as a one-record batch.
    pub fn single(message: impl Into<String>) -> Self {
        Self {
            records: vec![SnsEventRecord {
                event_source: Some("aws:sns".to_string()),
                sns: SnsMessage {
                    message: message.into(),
                    ..SnsMessage::default()
                },
            }],
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, EventError> {
        serde_json::from_slice(bytes).map_err(EventError::InvalidBatch)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SnsEventRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_source: Option<String>,
    pub sns: SnsMessage,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SnsMessage {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// EventBridge "CodePipeline Pipeline Execution State Change" event, as
/// carried inside the SNS message body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(rename = "detail-type", default)]
    pub detail_type: Option<String>,
    pub detail: PipelineEventDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEventDetail {
    pub pipeline: String,
    pub state: PipelineState,
    #[serde(rename = "execution-id", default)]
    pub execution_id: Option<String>,
}

impl PipelineEvent {
    /// Parse the JSON body of the `index`-th SNS record.
    pub fn from_message(index: usize, message: &str) -> Result<Self, EventError> {
        serde_json::from_str(message).map_err(|source| EventError::InvalidMessage { index, source })
    }
}

/// Which alert a state transition produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Failure,
    Recovery,
}

/// Outcome of comparing the reported state with the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Notify(AlertKind),
    Skip,
}

impl Decision {
    pub fn alert(&self) -> Option<AlertKind> {
        match self {
            Decision::Notify(kind) => Some(*kind),
            Decision::Skip => None,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Decision::Notify(AlertKind::Failure) => "failure",
            Decision::Notify(AlertKind::Recovery) => "recovery",
            Decision::Skip => "skip",
        };
        f.pad(name)
    }
}

/// What happened to one record of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct RecordOutcome {
    pub pipeline: String,
    pub state: PipelineState,
    pub previous: Option<PipelineState>,
    pub decision: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<Delivery>,
}

/// Per-record outcomes of one invocation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<RecordOutcome>,
}

impl BatchReport {
    pub fn notified(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.decision != Decision::Skip)
            .count()
    }

    /// The Lambda-style response returned to the invoker.
    pub fn response(&self) -> RelayResponse {
        RelayResponse::processed()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    pub status_code: u16,
    pub body: String,
}

impl RelayResponse {
    pub fn processed() -> Self {
        // The body is itself JSON-encoded, so it carries the quotes.
        Self {
            status_code: 200,
            body: "\"Event processed successfully.\"".to_string(),
        }
    }
}
