mod api;
mod cache;
mod config;
mod error;
mod fetch;
mod format;
mod history;
mod matcher;
mod resolver;
mod store;
mod types;
mod wiki;
mod worker;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::routes::{router, ApiState};
use crate::cache::MarketCache;
use crate::config::Config;
use crate::error::Result;
use crate::store::DailySnapshotStore;
use crate::wiki::WikiCache;
use crate::worker::RefreshWorker;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let cache = MarketCache::new(cfg.clone())?;
    let wiki = WikiCache::new(cfg.clone())?;
    let store = DailySnapshotStore::new(&cfg.data_dir);

    // --- Bootstrap cycle: hydrate caches, archive, prune ---
    // Identical to a worker tick; upstream failures degrade to stale or
    // empty data rather than aborting startup.
    let worker = RefreshWorker::new(
        cfg.clone(),
        cache.clone(),
        wiki.clone(),
        store.clone(),
    );
    worker.cycle().await;
    info!(
        hydrated = cache.hydrated().await,
        catalog_items = cache.catalog().await.map_or(0, |c| c.len()),
        "bootstrap cycle complete"
    );

    // --- Background maintenance (hourly) ---
    tokio::spawn(async move { worker.run().await });

    // --- HTTP API for the presentation layer ---
    let api_state = ApiState { cache, wiki, store };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
