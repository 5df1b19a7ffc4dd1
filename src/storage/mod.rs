pub mod dynamo_store;
pub mod json_store;
pub mod memory_store;

use anyhow::Result;
use async_trait::async_trait;

use crate::engine::types::PipelineRecord;

/// Persistence for the last-known state of each pipeline.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Fetch the record for `pipeline`, if one was ever written.
    async fn get_record(&self, pipeline: &str) -> Result<Option<PipelineRecord>>;

    /// Create or overwrite the record keyed by `record.pipeline_name`.
    async fn put_record(&self, record: &PipelineRecord) -> Result<()>;

    /// All stored records, sorted by pipeline name.
    async fn list_records(&self) -> Result<Vec<PipelineRecord>>;
}
