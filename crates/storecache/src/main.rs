use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use serde_json::json;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storecache::store::{BackendError, Query, Row};
use storecache::{CacheSweeper, CachedTable, Config, InMemoryBackend, MemoryCache};

/// Storecache - Simulated catalog traffic through the request cache
#[derive(Parser, Debug)]
#[command(name = "storecache")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Number of catalog reads to issue
    #[arg(long, short, default_value = "12", env = "DEMO_REQUESTS")]
    requests: u32,

    /// Number of transient backend failures to inject before the first read
    #[arg(long, short, default_value = "2", env = "DEMO_FAILURES")]
    failures: u32,

    /// Issue a price update every N reads (0 disables writes)
    #[arg(long, default_value = "5", env = "DEMO_WRITE_EVERY")]
    write_every: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storecache=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(?config, "Loaded configuration");

    let cache = MemoryCache::new(config.cache_settings());
    let sweeper = CacheSweeper::spawn(cache.clone(), config.sweep_interval());

    let backend = Arc::new(InMemoryBackend::with_demo_data().await);
    for _ in 0..cli.failures {
        backend
            .fail_next(BackendError::status(503, "service unavailable"))
            .await;
    }

    let retry = config
        .retry_options::<BackendError>()
        .on_retry(|attempt, error| {
            tracing::info!(attempt, error = %error, "Retrying catalog read");
        });
    let products = CachedTable::new(backend.clone(), cache.clone(), "products").with_retry(retry);

    tokio::select! {
        result = run_workload(&products, &cli) => result?,
        _ = shutdown_signal() => {}
    }

    let report = json!({
        "cache": cache.stats().await,
        "backend_selects": backend.select_calls(),
        "requests": cli.requests,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    sweeper.shutdown().await;
    tracing::info!("Demo finished");
    Ok(())
}

/// Reads alternating catalog pages, with a periodic write that invalidates
/// every cached products read.
async fn run_workload(products: &CachedTable<InMemoryBackend>, cli: &Cli) -> Result<()> {
    for request in 1..=cli.requests {
        let page = request % 2 + 1;
        let rows = products.list(&Query::new().paginate(page, 2)).await?;
        tracing::info!(request, page, rows = rows.len(), "Catalog page served");

        if cli.write_every > 0 && request % cli.write_every == 0 {
            let mut changes = Row::new();
            changes.insert("price_cents".to_string(), json!(10_000 + request));
            products.update("p-1", changes).await?;
            tracing::info!(request, "Updated product price");
        }
    }

    Ok(())
}

/// Wait for shutdown signals (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
