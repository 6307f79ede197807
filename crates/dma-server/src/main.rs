//! DataMiner Agent data source backend.
//!
//! Run with: `DMA_URL=https://dma.example.com dma-server`

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use dma_core::QueryHandler;
use dma_server::{ConfigLoader, app, logging};

#[derive(Parser)]
#[command(name = "dma-server", version, about = "DataMiner Agent data source backend")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, env = "DMA_CONFIG")]
    config: Option<PathBuf>,

    /// Test the connection to the agent and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    let config = ConfigLoader::load(cli.config.as_deref())?
        .with_env_overrides(|key| std::env::var(key).ok());
    config.validate()?;
    tracing::debug!(?config, "configuration loaded");

    let source = Arc::new(app::datasource(&config).context("Failed to build HTTP client")?);

    if cli.check {
        let health = source.check_health().await;
        println!("{}", health.message);
        if !health.is_success() {
            std::process::exit(1);
        }
        return Ok(());
    }

    let addr = config.listen_addr()?;
    let router = app::router(source, &config.server);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!(agent = %config.agent.url, "Server listening on http://{addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(app::shutdown_signal())
        .await?;

    Ok(())
}
