use thiserror::Error;

/// Problems with an inbound notification payload.
///
/// These are caller errors: the HTTP surface maps them to `400 Bad Request`.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("event batch is not valid SNS JSON: {0}")]
    InvalidBatch(#[source] serde_json::Error),

    #[error("record {index}: message is not a pipeline state-change event: {source}")]
    InvalidMessage {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("SNS envelope of type '{0}' is not supported")]
    UnsupportedEnvelope(String),

    #[error("SNS envelope of type '{kind}' is missing '{field}'")]
    MissingField { kind: String, field: &'static str },

    #[error("refusing to confirm subscription at untrusted URL '{0}'")]
    UntrustedSubscribeUrl(String),
}

/// Failures while resolving the webhook URL.
///
/// Messages name the secret but never include its value.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("failed to retrieve secret '{name}': {message}")]
    Retrieval { name: String, message: String },

    #[error("secret '{name}' has no string value")]
    Empty { name: String },

    #[error("secret '{name}' is not a JSON object: {source}")]
    NotJson {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("secret '{name}' has no string '{key}' key")]
    MissingKey { name: String, key: &'static str },
}
