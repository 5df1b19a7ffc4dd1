use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_dynamodb::config::Region;

/// Overrides applied on top of the default AWS credential and region chain.
#[derive(Debug, Clone, Default)]
pub struct AwsOptions {
    pub region: Option<String>,
    /// Alternate endpoint for every client, e.g. LocalStack.
    pub endpoint_url: Option<String>,
}

/// Load the shared SDK config used to build every AWS client.
pub async fn load_sdk_config(options: &AwsOptions) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &options.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(endpoint) = &options.endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }
    loader.load().await
}
