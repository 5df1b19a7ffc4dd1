use std::sync::Arc;

use async_trait::async_trait;
use lambda_runtime::{Context, LambdaEvent};

use pipewatch::engine::NotificationRelay;
use pipewatch::engine::types::{RelayResponse, SnsEvent};
use pipewatch::error::SecretError;
use pipewatch::identity::StaticIdentity;
use pipewatch::lambda::handle;
use pipewatch::notify::LogNotifier;
use pipewatch::secrets::{SecretSource, StaticSecret};
use pipewatch::storage::memory_store::MemoryStateStore;

struct MissingSecret;

#[async_trait]
impl SecretSource for MissingSecret {
    async fn webhook_url(&self) -> Result<String, SecretError> {
        Err(SecretError::Empty {
            name: "teams/webhook".to_string(),
        })
    }
}

fn relay(secrets: Arc<dyn SecretSource>) -> NotificationRelay {
    NotificationRelay::new(
        Arc::new(MemoryStateStore::new()),
        secrets,
        Arc::new(StaticIdentity::new("123456789012", "sa-east-1")),
        Arc::new(LogNotifier),
    )
}

fn event() -> SnsEvent {
    SnsEvent::single(r#"{"detail": {"pipeline": "web", "state": "FAILED"}}"#)
}

#[tokio::test]
async fn invocation_returns_processed_response() {
    let relay = relay(Arc::new(StaticSecret::new("https://hooks.example/1")));

    let response = handle(&relay, LambdaEvent::new(event(), Context::default()))
        .await
        .unwrap();
    assert_eq!(response, RelayResponse::processed());
}

#[tokio::test]
async fn secret_failure_fails_the_invocation() {
    let relay = relay(Arc::new(MissingSecret));

    let err = handle(&relay, LambdaEvent::new(event(), Context::default()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("teams/webhook"));
}
