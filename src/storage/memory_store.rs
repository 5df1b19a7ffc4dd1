use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::engine::types::PipelineRecord;
use crate::storage::StateStore;

/// In-memory state store. Records live as long as the store instance.
#[derive(Default)]
pub struct MemoryStateStore {
    records: RwLock<BTreeMap<String, PipelineRecord>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `records`.
    pub fn with_records(records: impl IntoIterator<Item = PipelineRecord>) -> Self {
        Self {
            records: RwLock::new(
                records
                    .into_iter()
                    .map(|r| (r.pipeline_name.clone(), r))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get_record(&self, pipeline: &str) -> Result<Option<PipelineRecord>> {
        Ok(self.records.read().await.get(pipeline).cloned())
    }

    async fn put_record(&self, record: &PipelineRecord) -> Result<()> {
        self.records
            .write()
            .await
            .insert(record.pipeline_name.clone(), record.clone());
        Ok(())
    }

    async fn list_records(&self) -> Result<Vec<PipelineRecord>> {
        Ok(self.records.read().await.values().cloned().collect())
    }
}
