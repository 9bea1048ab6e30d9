use std::path::PathBuf;

use clap::Parser;
use memo_retval::{runner, RestClient, RunConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "memo-retval")]
#[command(about = "Check a token id posted on-chain against a local one through a contract call", long_about = None)]
struct Cli {
    /// TOML run configuration; built-in testnet defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memo_retval=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };
    tracing::debug!(network = %config.network, rest_url = %config.rest_url, "loaded configuration");

    let client = RestClient::from_config(&config)?;
    runner::run(&config, &client).await?;

    Ok(())
}
