// Entry point for the grant fetch run

use aggregation::{AllowList, Fetcher};
use anyhow::{Context, Result};
use clap::Parser;
use grant_finder::{sources, Cli, Config};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,aggregation=debug,grant_finder=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    cli.apply(&mut config)?;
    tracing::debug!(?config, "Configuration loaded");

    let registry = sources::registry(&config);

    if cli.list {
        for fetcher in registry.discover(&AllowList::all()) {
            let meta = fetcher.metadata();
            println!("{}\t{}", meta.name, meta.key());
        }
        return Ok(());
    }

    // Ctrl-C abandons the run without touching the previous artifact
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling run");
            trigger.cancel();
        }
    });

    grant_finder::run(&config, &registry, cancel).await?;

    Ok(())
}
