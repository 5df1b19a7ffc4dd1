use std::io::Write;

use clap::Parser;

use pipewatch::cli::{Cli, Commands, PipewatchConfig, RecordsFormat, RelayArgs, RelayOptions};
use pipewatch::notify::card::CardLanguage;
use tempfile::NamedTempFile;

fn config_from(yaml: &str) -> PipewatchConfig {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(yaml.as_bytes()).unwrap();
    PipewatchConfig::load(Some(f.path())).unwrap()
}

#[test]
fn load_valid_config_all_fields() {
    let cfg = config_from(
        r#"
table: "pipeline-state"
store_dir: "data/records"
secret_name: "teams/webhook"
webhook_url: "https://example.webhook.office.com/webhookb2/x"
region: "sa-east-1"
endpoint_url: "http://localhost:4566"
account_id: "123456789012"
utc_offset_hours: -5
time_format: "%Y-%m-%d %H:%M"
language: en
console_url: "https://console.amazonaws-us-gov.com"
timeout_s: 10
host: "127.0.0.1"
port: 8080
max_body: 65536
"#,
    );

    assert_eq!(cfg.table.as_deref(), Some("pipeline-state"));
    assert_eq!(cfg.store_dir.as_deref(), Some("data/records"));
    assert_eq!(cfg.secret_name.as_deref(), Some("teams/webhook"));
    assert_eq!(cfg.region.as_deref(), Some("sa-east-1"));
    assert_eq!(cfg.account_id.as_deref(), Some("123456789012"));
    assert_eq!(cfg.utc_offset_hours, Some(-5));
    assert_eq!(cfg.time_format.as_deref(), Some("%Y-%m-%d %H:%M"));
    assert_eq!(cfg.language, Some(CardLanguage::En));
    assert_eq!(cfg.timeout_s, Some(10.0));
    assert_eq!(cfg.host.as_deref(), Some("127.0.0.1"));
    assert_eq!(cfg.port, Some(8080));
    assert_eq!(cfg.max_body, Some(65536));
}

#[test]
fn load_partial_config() {
    let cfg = config_from("table: pipeline-state\n");

    assert_eq!(cfg.table.as_deref(), Some("pipeline-state"));
    assert!(cfg.secret_name.is_none());
    assert!(cfg.utc_offset_hours.is_none());
    assert!(cfg.language.is_none());
    assert!(cfg.port.is_none());
}

#[test]
fn missing_explicit_path_returns_error() {
    let result = PipewatchConfig::load(Some(std::path::Path::new("/nonexistent/pipewatch.yaml")));
    assert!(result.is_err());
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("Config file not found")
    );
}

#[test]
fn invalid_yaml_returns_error() {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(b"port: [not, a, number]\n").unwrap();

    let err = PipewatchConfig::load(Some(f.path())).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn flags_override_config_and_defaults_fill_gaps() {
    let cfg = config_from(
        r#"
table: from-config
secret_name: teams/webhook
utc_offset_hours: -5
language: en
"#,
    );
    let args = RelayArgs {
        table: Some("from-flag".to_string()),
        utc_offset: Some(1),
        ..RelayArgs::default()
    };

    let options = RelayOptions::resolve(args, &cfg).unwrap();
    assert_eq!(options.table.as_deref(), Some("from-flag"));
    assert_eq!(options.secret_name.as_deref(), Some("teams/webhook"));
    assert_eq!(options.settings.utc_offset_hours, 1);
    assert_eq!(options.settings.language, CardLanguage::En);
    assert_eq!(options.settings.time_format, "%d-%m-%Y %H:%M:%S");
    assert_eq!(options.timeout.as_secs(), 30);
}

#[test]
fn resolve_rejects_bad_settings() {
    let cfg = PipewatchConfig::default();

    let bad_offset = RelayArgs {
        utc_offset: Some(99),
        ..RelayArgs::default()
    };
    assert!(RelayOptions::resolve(bad_offset, &cfg).is_err());

    let bad_timeout = RelayArgs {
        timeout: Some(0.0),
        ..RelayArgs::default()
    };
    assert!(RelayOptions::resolve(bad_timeout, &cfg).is_err());
}

#[tokio::test]
async fn local_relay_needs_no_aws() {
    let dir = tempfile::tempdir().unwrap();
    let args = RelayArgs {
        store_dir: Some(dir.path().to_path_buf()),
        webhook_url: Some("https://example.webhook.office.com/webhookb2/x".to_string()),
        account_id: Some("123456789012".to_string()),
        region: Some("sa-east-1".to_string()),
        ..RelayArgs::default()
    };

    let options = RelayOptions::resolve(args, &PipewatchConfig::default()).unwrap();
    let relay = options.relay(true).await.unwrap();
    assert!(relay.store().list_records().await.unwrap().is_empty());
}

#[tokio::test]
async fn relay_without_store_is_an_error() {
    let args = RelayArgs {
        webhook_url: Some("https://example.webhook.office.com/webhookb2/x".to_string()),
        account_id: Some("123456789012".to_string()),
        region: Some("sa-east-1".to_string()),
        ..RelayArgs::default()
    };
    let options = RelayOptions::resolve(args, &PipewatchConfig::default()).unwrap();

    let err = options.relay(false).await.err().unwrap();
    assert!(err.to_string().contains("A state store is required"));
}

#[test]
fn records_format_accepts_json() {
    let cli = Cli::try_parse_from(["pipewatch", "records", "--store-dir", "state", "--format", "json"])
        .unwrap();
    match cli.command {
        Some(Commands::Records { format, .. }) => assert_eq!(format, RecordsFormat::Json),
        _ => panic!("expected records command"),
    }
}

#[test]
fn records_format_rejects_unknown_value() {
    let result = Cli::try_parse_from(["pipewatch", "records", "--format", "jsn"]);
    assert!(result.is_err());
}
