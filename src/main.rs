use anyhow::Context;
use tracing_subscriber::EnvFilter;
use warden::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    Cli::run().await.context("supervisor failed")
}
