use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::engine::types::{RelayResponse, SnsEvent, SnsEventRecord, SnsMessage};
use crate::error::EventError;

use super::AppState;
use super::errors::AppError;

// --- Request/Response types ---

/// Body of an SNS HTTP(S) subscription delivery.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SnsEnvelope {
    #[serde(rename = "Type")]
    pub kind: String,
    pub message_id: Option<String>,
    pub topic_arn: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub timestamp: Option<String>,
    #[serde(rename = "SubscribeURL")]
    pub subscribe_url: Option<String>,
}

impl SnsEnvelope {
    fn into_event(self) -> Result<SnsEvent, EventError> {
        let message = self.message.ok_or_else(|| EventError::MissingField {
            kind: self.kind.clone(),
            field: "Message",
        })?;
        Ok(SnsEvent {
            records: vec![SnsEventRecord {
                event_source: Some("aws:sns".to_string()),
                sns: SnsMessage {
                    message,
                    message_id: self.message_id,
                    topic_arn: self.topic_arn,
                    subject: self.subject,
                    timestamp: self.timestamp,
                },
            }],
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnsAck {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notified: Option<usize>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Only SNS endpoints may be fetched to confirm a subscription.
pub fn is_trusted_subscribe_url(url: &str) -> bool {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        return false;
    };
    parsed.scheme() == "https" && parsed.host_str().is_some_and(is_sns_host)
}

/// `sns.<region>.amazonaws.com` (or `.com.cn`), with a single region label.
fn is_sns_host(host: &str) -> bool {
    let Some(rest) = host.strip_prefix("sns.") else {
        return false;
    };
    let region = rest
        .strip_suffix(".amazonaws.com")
        .or_else(|| rest.strip_suffix(".amazonaws.com.cn"));
    region.is_some_and(|region| {
        !region.is_empty()
            && region
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    })
}

// --- Handlers ---

/// POST /sns
pub async fn receive_sns(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SnsAck>, AppError> {
    // SNS posts with `Content-Type: text/plain`, so parse the raw body.
    let envelope: SnsEnvelope = serde_json::from_slice(&body).map_err(EventError::InvalidBatch)?;

    match envelope.kind.as_str() {
        "Notification" => {
            let event = envelope.into_event()?;
            let report = state.relay.handle_batch(&event).await?;
            Ok(Json(SnsAck {
                kind: "Notification".to_string(),
                status: "processed".to_string(),
                notified: Some(report.notified()),
            }))
        }
        "SubscriptionConfirmation" => {
            let url = envelope.subscribe_url.ok_or_else(|| EventError::MissingField {
                kind: envelope.kind.clone(),
                field: "SubscribeURL",
            })?;
            if !is_trusted_subscribe_url(&url) {
                warn!(url = %url, "Rejected subscription confirmation");
                return Err(EventError::UntrustedSubscribeUrl(url).into());
            }

            let response = state
                .http
                .get(&url)
                .send()
                .await
                .map_err(|e| AppError::Internal(e.into()))?;
            if !response.status().is_success() {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "Subscription confirmation returned status {}",
                    response.status()
                )));
            }

            info!(topic = envelope.topic_arn.as_deref().unwrap_or("-"), "Confirmed SNS subscription");
            Ok(Json(SnsAck {
                kind: envelope.kind,
                status: "confirmed".to_string(),
                notified: None,
            }))
        }
        "UnsubscribeConfirmation" => {
            info!(topic = envelope.topic_arn.as_deref().unwrap_or("-"), "SNS subscription removed");
            Ok(Json(SnsAck {
                kind: envelope.kind,
                status: "ignored".to_string(),
                notified: None,
            }))
        }
        _ => Err(EventError::UnsupportedEnvelope(envelope.kind).into()),
    }
}

/// POST /events
pub async fn receive_events(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<RelayResponse>, AppError> {
    let event = SnsEvent::from_slice(&body)?;
    let report = state.relay.handle_batch(&event).await?;
    Ok(Json(report.response()))
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
