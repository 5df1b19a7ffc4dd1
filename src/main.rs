use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // CloudWatch stores raw stdout, so drop colour codes inside Lambda.
    let in_lambda = std::env::var_os(pipewatch::cli::LAMBDA_RUNTIME_ENV).is_some();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(!in_lambda)
        .init();

    if let Err(e) = pipewatch::cli::run_cli().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
