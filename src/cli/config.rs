use std::path::Path;

use anyhow::{Context as _, Result};
use serde::Deserialize;

use crate::notify::card::CardLanguage;

pub const DEFAULT_CONFIG_FILE: &str = "pipewatch.yaml";

/// Configuration loaded from `pipewatch.yaml`.
/// All fields are optional — missing fields fall back to CLI/env/defaults.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct PipewatchConfig {
    /// DynamoDB table holding pipeline state records.
    pub table: Option<String>,
    /// Directory for the file-backed store; takes precedence over `table`.
    pub store_dir: Option<String>,
    /// Secrets Manager secret whose JSON carries `WEBHOOK_URL`.
    pub secret_name: Option<String>,
    /// Webhook URL used as-is, bypassing Secrets Manager.
    pub webhook_url: Option<String>,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub account_id: Option<String>,
    pub utc_offset_hours: Option<i32>,
    pub time_format: Option<String>,
    pub language: Option<CardLanguage>,
    pub console_url: Option<String>,
    /// Webhook request timeout in seconds.
    pub timeout_s: Option<f64>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_body: Option<usize>,
}

impl PipewatchConfig {
    /// Load configuration from a YAML file.
    ///
    /// - If `path` is `Some`, load that specific file (error if missing).
    /// - If `path` is `None`, auto-detect `pipewatch.yaml` in cwd; return defaults if absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file_path = match path {
            Some(p) => {
                if !p.exists() {
                    anyhow::bail!("Config file not found: {}", p.display());
                }
                p.to_path_buf()
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if !default_path.exists() {
                    return Ok(Self::default());
                }
                default_path.to_path_buf()
            }
        };

        let contents = std::fs::read_to_string(&file_path)
            .with_context(|| format!("Failed to read config file: {}", file_path.display()))?;

        let config: PipewatchConfig = serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", file_path.display()))?;

        Ok(config)
    }
}
