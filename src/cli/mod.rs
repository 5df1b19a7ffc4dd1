pub mod config;
pub mod relay;

pub use config::PipewatchConfig;
pub use relay::{RelayArgs, RelayOptions};

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{CommandFactory, Parser, Subcommand};
use tracing::info;

use crate::diagram::{self, DiagramFormat};
use crate::engine::types::SnsEvent;

/// Set by the Lambda service in every function container.
pub const LAMBDA_RUNTIME_ENV: &str = "AWS_LAMBDA_RUNTIME_API";

#[derive(Parser)]
#[command(
    name = "pipewatch",
    version,
    about = "Relay CodePipeline state changes to a Teams webhook"
)]
pub struct Cli {
    /// Path to a .env file to load (default: auto-detect .env in cwd)
    #[arg(long, global = true)]
    dotenv: Option<PathBuf>,

    /// Path to a YAML config file (default: auto-detect pipewatch.yaml in cwd)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Runs in Lambda mode when omitted inside a Lambda container
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve SNS-triggered invocations through the Lambda runtime API
    Lambda {
        #[command(flatten)]
        relay: RelayArgs,
    },

    /// Accept SNS HTTP(S) subscription deliveries
    Serve {
        #[command(flatten)]
        relay: RelayArgs,

        /// Host to bind to
        #[arg(long, env = "HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        /// Maximum request body size in bytes (default: 262144 = 256 KB, the SNS limit)
        #[arg(long, env = "MAX_BODY")]
        max_body: Option<usize>,
    },

    /// Process a saved SNS event JSON file
    Replay {
        /// Path to the event file (Lambda SNS event shape)
        event: PathBuf,

        #[command(flatten)]
        relay: RelayArgs,

        /// Log the cards instead of posting them
        #[arg(long)]
        dry_run: bool,
    },

    /// List stored pipeline state records
    Records {
        #[command(flatten)]
        relay: RelayArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: RecordsFormat,
    },

    /// Render the architecture diagram
    Diagram {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format; png and svg require Graphviz
        #[arg(short, long, value_enum, default_value = "dot")]
        format: DiagramFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RecordsFormat {
    Table,
    Json,
}

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_BODY: usize = 256 * 1024;

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Load .env file
    load_dotenv(cli.dotenv.as_deref());

    let config = PipewatchConfig::load(cli.config.as_deref())?;

    let command = match cli.command {
        Some(command) => command,
        // Lambda starts the bootstrap binary without arguments; re-parse so
        // the relay flags still pick up their env fallbacks.
        None if std::env::var_os(LAMBDA_RUNTIME_ENV).is_some() => {
            Cli::try_parse_from(["pipewatch", "lambda"])?
                .command
                .ok_or_else(|| anyhow::anyhow!("Failed to select Lambda mode"))?
        }
        None => {
            Cli::command().print_help()?;
            return Ok(());
        }
    };

    match command {
        Commands::Lambda { relay } => {
            let relay = RelayOptions::resolve(relay, &config)?.relay(false).await?;
            crate::lambda::run(relay).await
        }
        Commands::Serve {
            relay,
            host,
            port,
            max_body,
        } => {
            let host = host
                .or_else(|| config.host.clone())
                .unwrap_or_else(|| DEFAULT_HOST.to_string());
            let port = port.or(config.port).unwrap_or(DEFAULT_PORT);
            let max_body = max_body.or(config.max_body).unwrap_or(DEFAULT_MAX_BODY);
            let relay = RelayOptions::resolve(relay, &config)?.relay(false).await?;
            crate::api::serve(&host, port, relay, max_body).await
        }
        Commands::Replay {
            event,
            relay,
            dry_run,
        } => cmd_replay(event, RelayOptions::resolve(relay, &config)?, dry_run).await,
        Commands::Records { relay, format } => {
            cmd_records(RelayOptions::resolve(relay, &config)?, format).await
        }
        Commands::Diagram { output, format } => cmd_diagram(output, format).await,
    }
}

/// Load environment variables from a .env file.
/// If an explicit path is given, load from that path (error if missing).
/// Otherwise, auto-detect .env in the current working directory (silently skip if absent).
fn load_dotenv(explicit_path: Option<&std::path::Path>) {
    match explicit_path {
        Some(path) => match dotenvy::from_path(path) {
            Ok(()) => info!("Loaded env from {}", path.display()),
            Err(e) => {
                eprintln!(
                    "Warning: Failed to load dotenv file '{}': {}",
                    path.display(),
                    e
                );
            }
        },
        None => match dotenvy::dotenv() {
            Ok(path) => info!("Loaded env from {}", path.display()),
            Err(dotenvy::Error::Io(_)) => {}
            Err(e) => {
                eprintln!("Warning: Failed to parse .env file: {}", e);
            }
        },
    }
}

async fn cmd_replay(event_path: PathBuf, options: RelayOptions, dry_run: bool) -> Result<()> {
    let data = tokio::fs::read(&event_path)
        .await
        .with_context(|| format!("Failed to read event file: {}", event_path.display()))?;
    let event = SnsEvent::from_slice(&data)
        .with_context(|| format!("Failed to parse event file: {}", event_path.display()))?;

    let relay = options.relay(dry_run).await?;
    let report = relay.handle_batch(&event).await?;

    println!("Records: {}", report.outcomes.len());
    for outcome in &report.outcomes {
        let previous = outcome
            .previous
            .as_ref()
            .map(|s| s.as_str())
            .unwrap_or("UNKNOWN");
        let delivery = match &outcome.delivery {
            Some(d) if d.success => format!("sent ({})", d.status),
            Some(d) => format!("rejected ({})", d.status),
            None => "-".to_string(),
        };
        println!(
            "  {:<30} {:<10} (was {:<10}) {:<9} {}",
            outcome.pipeline,
            outcome.state,
            previous,
            outcome.decision,
            delivery
        );
    }

    println!("\n{}", serde_json::to_string_pretty(&report.response())?);
    Ok(())
}

async fn cmd_records(options: RelayOptions, format: RecordsFormat) -> Result<()> {
    let store = options.store().await?;
    let records = store.list_records().await?;

    if records.is_empty() {
        println!("No records found.");
        return Ok(());
    }

    if format == RecordsFormat::Json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!("{:<40} {:<12} {:<20}", "PIPELINE", "STATE", "LAST UPDATE");
    println!("{}", "-".repeat(72));
    for record in &records {
        println!(
            "{:<40} {:<12} {:<20}",
            record.pipeline_name, record.state, record.last_update_time
        );
    }

    println!("\nTotal: {} record(s)", records.len());
    Ok(())
}

async fn cmd_diagram(output: Option<PathBuf>, format: DiagramFormat) -> Result<()> {
    let diagram = diagram::architecture::notification_system();
    let bytes = diagram::render(&diagram, format).await?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, &bytes)
                .await
                .with_context(|| format!("Failed to write diagram: {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => {
            use std::io::Write as _;
            std::io::stdout().write_all(&bytes)?;
        }
    }
    Ok(())
}
