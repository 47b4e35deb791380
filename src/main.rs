use clap::Parser;
use tracing_subscriber::EnvFilter;

use phase_matrix_api::cli::{self, Cli};
use phase_matrix_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and the key pair
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    tracing::info!("Starting Phase Matrix API in {:?} mode", config.environment);

    cli::run(cli, config).await
}
