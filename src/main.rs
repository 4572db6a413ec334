//! media-browser: list a folder (or the storage roots) and print the catalog
//!
//! Usage: `media-browser [PATH|URI]`. Entries are printed as JSON lines once
//! the listing and its folder descriptions are ready.

use media_browser::adapters::LocalDirectorySource;
use media_browser::bus::{self, BrowserEvent};
use media_browser::config;
use media_browser::dataset::{DatasetSink, LiveDataset};
use media_browser::prefetch::PrefetchCache;
use media_browser::provider::{BrowserProvider, ProviderContext, ProviderOptions};

use anyhow::{bail, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Give up waiting for descriptions after this long and print what we have
const LISTING_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "media_browser=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!(
        "Starting media-browser v{} ({})",
        env!("MEDIA_BROWSER_VERSION"),
        env!("MEDIA_BROWSER_GIT_SHA")
    );

    let config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to load configuration, using defaults: {}", e);
            config::Config::default()
        }
    };

    let location = match std::env::args().nth(1) {
        Some(arg) => match config::resolve_location(&arg) {
            Some(location) => Some(location),
            None => bail!("not a path or URI: {:?}", arg),
        },
        None => None,
    };

    let bus = bus::create_bus();
    let dataset = Arc::new(LiveDataset::new(bus.clone()));
    let ctx = ProviderContext {
        source: Arc::new(LocalDirectorySource::new()),
        library: None,
        dataset: dataset.clone(),
        prefetch: PrefetchCache::shared(),
        bus: bus.clone(),
    };
    let provider = BrowserProvider::spawn(ProviderOptions::from_config(&config, location), ctx);

    let mut events = bus.subscribe();
    provider.fetch();

    tokio::select! {
        settled = wait_for_listing(&mut events) => {
            if !settled {
                tracing::warn!("Event bus closed before the listing settled");
            }
        }
        _ = tokio::time::sleep(LISTING_TIMEOUT) => {
            tracing::warn!("Timed out after {:?}, printing partial listing", LISTING_TIMEOUT);
        }
        _ = shutdown_signal() => {
            provider.release();
            provider.closed().await;
            return Ok(());
        }
    }

    for item in dataset.snapshot() {
        println!("{}", serde_json::to_string(&item)?);
    }

    provider.release();
    provider.closed().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Wait until the folder was parsed, or turned out to be empty
async fn wait_for_listing(events: &mut broadcast::Receiver<BrowserEvent>) -> bool {
    loop {
        match events.recv().await {
            Ok(BrowserEvent::ChildrenParsed { parsed }) => {
                tracing::debug!("Listing settled, {} folders parsed", parsed);
                return true;
            }
            Ok(BrowserEvent::DatasetCleared) => return true,
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::debug!("Skipped {} events", n);
            }
            Err(broadcast::error::RecvError::Closed) => return false,
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
