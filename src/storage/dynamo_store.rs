use std::collections::HashMap;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;

use crate::engine::types::{PipelineRecord, PipelineState};
use crate::storage::StateStore;

pub const KEY_ATTR: &str = "pipelineName";
pub const STATE_ATTR: &str = "state";
pub const UPDATED_ATTR: &str = "lastUpdateTime";

type Item = HashMap<String, AttributeValue>;

/// DynamoDB-backed store: one item per pipeline, partition key `pipelineName`.
pub struct DynamoStateStore {
    client: Client,
    table: String,
}

impl DynamoStateStore {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    pub fn from_sdk_config(config: &aws_config::SdkConfig, table: impl Into<String>) -> Self {
        Self::new(Client::new(config), table)
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

fn string_attr<'a>(item: &'a Item, name: &str) -> Option<&'a str> {
    item.get(name)
        .and_then(|value| value.as_s().ok())
        .map(String::as_str)
}

pub fn record_to_item(record: &PipelineRecord) -> Item {
    HashMap::from([
        (
            KEY_ATTR.to_string(),
            AttributeValue::S(record.pipeline_name.clone()),
        ),
        (
            STATE_ATTR.to_string(),
            AttributeValue::S(record.state.to_string()),
        ),
        (
            UPDATED_ATTR.to_string(),
            AttributeValue::S(record.last_update_time.clone()),
        ),
    ])
}

pub fn item_to_record(item: &Item) -> Result<PipelineRecord> {
    let pipeline_name = string_attr(item, KEY_ATTR)
        .ok_or_else(|| anyhow::anyhow!("Item is missing string attribute '{}'", KEY_ATTR))?;
    let state = string_attr(item, STATE_ATTR).ok_or_else(|| {
        anyhow::anyhow!(
            "Item for pipeline '{}' is missing string attribute '{}'",
            pipeline_name,
            STATE_ATTR
        )
    })?;

    Ok(PipelineRecord {
        pipeline_name: pipeline_name.to_string(),
        state: PipelineState::from(state),
        last_update_time: string_attr(item, UPDATED_ATTR)
            .unwrap_or_default()
            .to_string(),
    })
}

#[async_trait]
impl StateStore for DynamoStateStore {
    async fn get_record(&self, pipeline: &str) -> Result<Option<PipelineRecord>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key(KEY_ATTR, AttributeValue::S(pipeline.to_string()))
            .send()
            .await
            .with_context(|| format!("DynamoDB GetItem failed on table '{}'", self.table))?;

        output.item().map(item_to_record).transpose()
    }

    async fn put_record(&self, record: &PipelineRecord) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(record_to_item(record)))
            .send()
            .await
            .with_context(|| format!("DynamoDB PutItem failed on table '{}'", self.table))?;
        Ok(())
    }

    async fn list_records(&self) -> Result<Vec<PipelineRecord>> {
        let mut records = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.table)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .with_context(|| format!("DynamoDB Scan failed on table '{}'", self.table))?;

            for item in output.items() {
                records.push(item_to_record(item)?);
            }

            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        records.sort_by(|a, b| a.pipeline_name.cmp(&b.pipeline_name));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_item_uses_deployed_attribute_names() {
        let record = PipelineRecord {
            pipeline_name: "billing-api".to_string(),
            state: PipelineState::Failed,
            last_update_time: "05-03-2025 14:22:01".to_string(),
        };

        let item = record_to_item(&record);
        assert_eq!(string_attr(&item, "pipelineName"), Some("billing-api"));
        assert_eq!(string_attr(&item, "state"), Some("FAILED"));
        assert_eq!(string_attr(&item, "lastUpdateTime"), Some("05-03-2025 14:22:01"));
        assert_eq!(item_to_record(&item).unwrap(), record);
    }

    #[test]
    fn item_without_timestamp_reads_as_empty() {
        let item = HashMap::from([
            (KEY_ATTR.to_string(), AttributeValue::S("web".to_string())),
            (STATE_ATTR.to_string(), AttributeValue::S("SUCCEEDED".to_string())),
        ]);
        let record = item_to_record(&item).unwrap();
        assert_eq!(record.state, PipelineState::Succeeded);
        assert!(record.last_update_time.is_empty());
    }

    #[test]
    fn item_without_state_is_rejected() {
        let item = HashMap::from([(KEY_ATTR.to_string(), AttributeValue::S("web".to_string()))]);
        let err = item_to_record(&item).unwrap_err().to_string();
        assert!(err.contains("'state'"), "got: {}", err);
    }
}
