//! File-backed market cache: the single authority on catalog/price staleness.
//!
//! Owns `items.json`, `prices.json` and `refresh.json` under the data dir.
//! No other component touches those files.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::fetch;
use crate::types::{Catalog, PriceQuote, PriceSnapshot, quote_from};

/// Persisted refresh bookkeeping — survives process restarts so a freshly
/// started process does not re-fetch data that is still within the interval.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RefreshState {
    last_refresh_secs: u64,
}

#[derive(Default)]
struct CacheState {
    /// Disk state has been read into memory at least once.
    loaded: bool,
    last_refresh_secs: u64,
    catalog: Option<Arc<Catalog>>,
    prices: Option<Arc<PriceSnapshot>>,
}

pub struct MarketCache {
    cfg: Config,
    client: reqwest::Client,
    /// One async mutex over the whole cache state. Holding it across the
    /// network fetch is the single-flight guard: concurrent `ensure_fresh`
    /// callers queue behind the in-flight refresh and observe its result.
    state: Mutex<CacheState>,
}

impl MarketCache {
    pub fn new(cfg: Config) -> Result<Arc<Self>> {
        let client = fetch::build_client(&cfg)?;
        Ok(Arc::new(Self { cfg, client, state: Mutex::new(CacheState::default()) }))
    }

    fn items_path(&self) -> PathBuf {
        PathBuf::from(&self.cfg.data_dir).join("items.json")
    }

    fn prices_path(&self) -> PathBuf {
        PathBuf::from(&self.cfg.data_dir).join("prices.json")
    }

    fn refresh_path(&self) -> PathBuf {
        PathBuf::from(&self.cfg.data_dir).join("refresh.json")
    }

    /// Refetch catalog and prices when the cached snapshot is absent or
    /// older than the refresh interval.
    ///
    /// A failed fetch keeps the stale data and does NOT advance the refresh
    /// timestamp, so the next call retries immediately. Upstream trouble is
    /// logged, never returned — callers degrade to whatever the cache holds.
    pub async fn ensure_fresh(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.loaded {
            self.load_from_disk(&mut state).await;
            state.loaded = true;
        }

        let now = now_secs();
        let have_data = state.catalog.is_some() && state.prices.is_some();
        if have_data && now.saturating_sub(state.last_refresh_secs) <= self.cfg.refresh_interval_secs
        {
            debug!(
                age_secs = now.saturating_sub(state.last_refresh_secs),
                "cache fresh, skipping refetch"
            );
            return Ok(());
        }

        let fetched = async {
            let catalog = fetch::fetch_catalog(&self.client, &self.cfg).await?;
            let prices = fetch::fetch_prices(&self.client, &self.cfg).await?;
            Result::Ok((catalog, prices))
        }
        .await;

        match fetched {
            Ok((catalog, prices)) => {
                if let Err(e) = self.persist(&catalog, &prices, now).await {
                    warn!("failed to persist market cache: {e}");
                }
                info!(
                    items = catalog.len(),
                    categories = prices.len(),
                    "market cache refreshed"
                );
                state.catalog = Some(Arc::new(catalog));
                state.prices = Some(Arc::new(prices));
                state.last_refresh_secs = now;
            }
            Err(e) => {
                // Stale data stays; timestamp stays. Next caller retries.
                warn!("market refresh failed, serving stale cache: {e}");
            }
        }

        Ok(())
    }

    /// The current catalog, if any data has ever been fetched or persisted.
    pub async fn catalog(&self) -> Option<Arc<Catalog>> {
        let mut state = self.state.lock().await;
        if !state.loaded {
            self.load_from_disk(&mut state).await;
            state.loaded = true;
        }
        state.catalog.clone()
    }

    /// The current price snapshot, used by the daily archive cycle.
    pub async fn current_snapshot(&self) -> Option<Arc<PriceSnapshot>> {
        let mut state = self.state.lock().await;
        if !state.loaded {
            self.load_from_disk(&mut state).await;
            state.loaded = true;
        }
        state.prices.clone()
    }

    /// Current buy/sell prices for a canonical key, across all categories.
    pub async fn current_price(&self, key: &str) -> Option<PriceQuote> {
        let snapshot = self.current_snapshot().await?;
        quote_from(&snapshot, key)
    }

    /// True once both catalog and prices are available in memory.
    pub async fn hydrated(&self) -> bool {
        let state = self.state.lock().await;
        state.catalog.is_some() && state.prices.is_some()
    }

    /// Read persisted state. A missing or malformed file is treated as "no
    /// cache data" — the refresh timestamp stays 0, forcing a refetch.
    async fn load_from_disk(&self, state: &mut CacheState) {
        state.catalog = match tokio::fs::read(self.items_path()).await {
            Ok(bytes) => serde_json::from_slice::<serde_json::Value>(&bytes)
                .ok()
                .as_ref()
                .and_then(Catalog::from_value)
                .map(Arc::new),
            Err(_) => None,
        };
        state.prices = match tokio::fs::read(self.prices_path()).await {
            Ok(bytes) => serde_json::from_slice::<PriceSnapshot>(&bytes).ok().map(Arc::new),
            Err(_) => None,
        };

        if state.catalog.is_none() || state.prices.is_none() {
            if state.catalog.is_some() || state.prices.is_some() {
                warn!("partial or malformed market cache on disk, forcing refresh");
            }
            state.last_refresh_secs = 0;
            return;
        }

        state.last_refresh_secs = match tokio::fs::read(self.refresh_path()).await {
            Ok(bytes) => serde_json::from_slice::<RefreshState>(&bytes)
                .map(|r| r.last_refresh_secs)
                .unwrap_or(0),
            Err(_) => 0,
        };
        debug!(
            last_refresh_secs = state.last_refresh_secs,
            "loaded market cache from disk"
        );
    }

    async fn persist(&self, catalog: &Catalog, prices: &PriceSnapshot, now: u64) -> Result<()> {
        tokio::fs::create_dir_all(&self.cfg.data_dir).await?;
        tokio::fs::write(self.items_path(), serde_json::to_vec(catalog)?).await?;
        tokio::fs::write(self.prices_path(), serde_json::to_vec(prices)?).await?;
        let refresh = RefreshState { last_refresh_secs: now };
        tokio::fs::write(self.refresh_path(), serde_json::to_vec(&refresh)?).await?;
        Ok(())
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
