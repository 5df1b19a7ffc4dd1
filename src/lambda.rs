use std::sync::Arc;

use anyhow::Result;
use lambda_runtime::{Error, LambdaEvent, service_fn};
use tracing::{error, info};

use crate::engine::NotificationRelay;
use crate::engine::types::{RelayResponse, SnsEvent};

/// Run the relay under the Lambda runtime API until the container is frozen.
pub async fn run(relay: NotificationRelay) -> Result<()> {
    let relay = Arc::new(relay);
    info!("Starting Lambda runtime");

    lambda_runtime::run(service_fn(move |event: LambdaEvent<SnsEvent>| {
        let relay = relay.clone();
        async move { handle(&relay, event).await }
    }))
    .await
    .map_err(|e| anyhow::anyhow!("Lambda runtime failed: {}", e))
}

/// One invocation. Failures are logged and returned so Lambda marks the
/// invocation as failed.
pub async fn handle(
    relay: &NotificationRelay,
    event: LambdaEvent<SnsEvent>,
) -> Result<RelayResponse, Error> {
    let (payload, context) = event.into_parts();
    info!(
        request_id = %context.request_id,
        records = payload.records.len(),
        "Received SNS batch"
    );

    match relay.handle_batch(&payload).await {
        Ok(report) => Ok(report.response()),
        Err(e) => {
            error!(request_id = %context.request_id, error = %format!("{:#}", e), "Invocation failed");
            Err(Error::from(format!("{:#}", e)))
        }
    }
}
