//! Upstream market-API client: catalog and price-snapshot fetches.

use std::time::Duration;

use crate::config::{Config, FETCH_TIMEOUT_SECS};
use crate::error::{AppError, Result};
use crate::types::{Catalog, PriceSnapshot};

/// Build the shared HTTP client. The upstream has no server-side timeout
/// discipline, so every request carries a bounded client-side one — a
/// stalled fetch must surface as a failure, not wedge the refresh cycle.
pub fn build_client(cfg: &Config) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .user_agent(cfg.api_user.clone())
        .build()?;
    Ok(client)
}

/// `GET {base}/items` → the full item catalog.
///
/// The document is either an array of canonical keys or a key → display-name
/// object; both load into the same `Catalog`, preserving document order.
pub async fn fetch_catalog(client: &reqwest::Client, cfg: &Config) -> Result<Catalog> {
    let url = format!("{}/items", cfg.market_api_url);
    let resp = client
        .get(&url)
        .basic_auth(&cfg.api_user, Some(&cfg.api_key))
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(AppError::Upstream(format!(
            "GET /items returned {}",
            resp.status()
        )));
    }

    let doc: serde_json::Value = resp.json().await?;
    Catalog::from_value(&doc).ok_or_else(|| {
        AppError::Upstream("GET /items response was neither an array nor an object".to_string())
    })
}

/// `GET {base}/prices` → the current price snapshot,
/// `{category: {itemKey: [{orderSide, price}, ...]}}`.
pub async fn fetch_prices(client: &reqwest::Client, cfg: &Config) -> Result<PriceSnapshot> {
    let url = format!("{}/prices", cfg.market_api_url);
    let resp = client
        .get(&url)
        .basic_auth(&cfg.api_user, Some(&cfg.api_key))
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(AppError::Upstream(format!(
            "GET /prices returned {}",
            resp.status()
        )));
    }

    let snapshot: PriceSnapshot = resp.json().await?;
    Ok(snapshot)
}
