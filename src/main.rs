// main.rs
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use papers_digest::cli::{self, Cli};
use papers_digest::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    cli::run(cli, config).await
}
