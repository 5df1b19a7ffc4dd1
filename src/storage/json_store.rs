use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::warn;

use crate::engine::types::PipelineRecord;
use crate::storage::StateStore;

/// File-based JSON state store. Each pipeline is stored as a separate JSON file.
pub struct JsonStateStore {
    base_dir: PathBuf,
    lock: RwLock<()>,
}

impl JsonStateStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            lock: RwLock::new(()),
        }
    }

    fn record_path(&self, pipeline: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", file_stem(pipeline)))
    }

    async fn read_record(&self, path: &Path) -> Result<PipelineRecord> {
        let data = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read record file: {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse record file: {}", path.display()))
    }
}

/// Map a pipeline name onto a file stem, percent-encoding every byte outside
/// `[A-Za-z0-9._-]` so distinct names never share a file.
fn file_stem(pipeline: &str) -> String {
    let mut stem = String::with_capacity(pipeline.len());
    for b in pipeline.bytes() {
        match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' => stem.push(b as char),
            _ => stem.push_str(&format!("%{:02X}", b)),
        }
    }
    stem
}

#[async_trait]
impl StateStore for JsonStateStore {
    async fn get_record(&self, pipeline: &str) -> Result<Option<PipelineRecord>> {
        let _lock = self.lock.read().await;
        let path = self.record_path(pipeline);
        if !path.exists() {
            return Ok(None);
        }
        let record = self.read_record(&path).await?;
        if record.pipeline_name != pipeline {
            warn!(
                pipeline = %pipeline,
                stored = %record.pipeline_name,
                path = %path.display(),
                "Record file belongs to another pipeline, ignoring"
            );
            return Ok(None);
        }
        Ok(Some(record))
    }

    async fn put_record(&self, record: &PipelineRecord) -> Result<()> {
        let _lock = self.lock.write().await;

        tokio::fs::create_dir_all(&self.base_dir)
            .await
            .with_context(|| format!("Failed to create store dir: {}", self.base_dir.display()))?;

        let path = self.record_path(&record.pipeline_name);
        let tmp_path = path.with_extension("json.tmp");

        let data = serde_json::to_string_pretty(record)?;
        tokio::fs::write(&tmp_path, &data).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        Ok(())
    }

    async fn list_records(&self) -> Result<Vec<PipelineRecord>> {
        let _lock = self.lock.read().await;

        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.base_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                records.push(self.read_record(&path).await?);
            }
        }

        records.sort_by(|a, b| a.pipeline_name.cmp(&b.pipeline_name));
        Ok(records)
    }
}
