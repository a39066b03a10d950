//! Periodic refresh/archive/prune cycle.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{error, warn};

use crate::cache::MarketCache;
use crate::config::Config;
use crate::store::DailySnapshotStore;
use crate::wiki::WikiCache;

/// Runs the hourly maintenance cycle: refresh both caches, archive the
/// current price snapshot into today's daily slot, prune the archive.
///
/// Shares the caches' own single-flight guards with in-flight queries, so
/// it neither blocks them nor races their refreshes. Abandoned mid-sleep on
/// shutdown — nothing here needs cancellation.
pub struct RefreshWorker {
    cfg: Config,
    cache: Arc<MarketCache>,
    wiki: Arc<WikiCache>,
    store: Arc<DailySnapshotStore>,
}

impl RefreshWorker {
    pub fn new(
        cfg: Config,
        cache: Arc<MarketCache>,
        wiki: Arc<WikiCache>,
        store: Arc<DailySnapshotStore>,
    ) -> Self {
        Self { cfg, cache, wiki, store }
    }

    pub async fn run(self) {
        let mut ticker = interval(Duration::from_secs(self.cfg.refresh_interval_secs));
        ticker.tick().await; // skip immediate first tick — bootstrap already ran

        loop {
            ticker.tick().await;
            self.cycle().await;
        }
    }

    /// One maintenance pass. Every step is independently recoverable; a
    /// failed step is logged and the rest of the pass still runs.
    pub async fn cycle(&self) {
        if let Err(e) = self.cache.ensure_fresh().await {
            error!("market cache refresh failed: {e}");
        }

        match self.cache.current_snapshot().await {
            Some(snapshot) => {
                if let Err(e) = self.store.write_today(&snapshot).await {
                    error!("daily snapshot archive failed: {e}");
                }
            }
            None => warn!("no price snapshot available, skipping daily archive"),
        }

        self.store.prune_older_than(self.cfg.retention_days).await;

        if let Err(e) = self.wiki.ensure_fresh().await {
            error!("wiki catalog refresh failed: {e}");
        }
    }
}
