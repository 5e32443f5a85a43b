//! Gavel Watch binary.
//!
//! Entry point for the headless auction watcher.

use anyhow::Context;
use gavel_watch::{StopReason, WatchConfig, WatchService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gavel_sdk=debug,gavel_watch=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WatchConfig::from_env().context("invalid configuration")?;

    tracing::info!("Starting Gavel watcher");
    tracing::info!("API URL: {}", config.api_url);
    tracing::info!("Live URL: {}", config.ws_url);
    tracing::info!("Auction: {}", config.auction_id);
    if config.token.is_none() {
        tracing::warn!("GAVEL_TOKEN not set, live updates disabled");
    }

    let service = WatchService::new(config)?;
    let outcome = service
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    match (outcome.reason, outcome.view) {
        (StopReason::Finished(status), Some(view)) => {
            tracing::info!("Auction {} closed {} at {}", view.id(), status, view.current_bid());
        }
        (reason, _) => tracing::info!("Watcher stopped: {:?}", reason),
    }

    Ok(())
}
