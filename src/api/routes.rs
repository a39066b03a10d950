//! HTTP surface consumed by the command/presentation layer.
//!
//! The bot frontend turns these JSON payloads into user-facing messages;
//! everything message- or image-shaped lives on that side of the seam.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::MarketCache;
use crate::config::{DEFAULT_HISTORY_DAYS, RETENTION_DAYS};
use crate::format::{format_item_name, PriceFormat};
use crate::history;
use crate::resolver;
use crate::store::DailySnapshotStore;
use crate::types::HistorySeries;
use crate::wiki::WikiCache;

#[derive(Clone)]
pub struct ApiState {
    pub cache: Arc<MarketCache>,
    pub wiki: Arc<WikiCache>,
    pub store: Arc<DailySnapshotStore>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/resolve", get(get_resolve))
        .route("/item", get(get_item))
        .route("/history/:key", get(get_history))
        .route("/op/resolve", get(get_op_resolve))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ResolveQuery {
    pub q: String,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub days: Option<u32>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub market_cache_hydrated: bool,
    pub catalog_items: usize,
}

#[derive(Serialize)]
pub struct ResolveResponse {
    pub key: String,
    pub display_name: String,
}

#[derive(Serialize)]
pub struct ItemResponse {
    pub key: String,
    pub display_name: String,
    pub formatted_name: String,
    pub buy: Option<f64>,
    pub sell: Option<f64>,
    pub buy_formatted: Option<String>,
    pub sell_formatted: Option<String>,
}

#[derive(Serialize)]
pub struct OpItemResponse {
    pub key: String,
    pub display_name: String,
    pub category: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    let catalog_items = state.cache.catalog().await.map_or(0, |c| c.len());
    Json(HealthResponse {
        status: "ok",
        market_cache_hydrated: state.cache.hydrated().await,
        catalog_items,
    })
}

/// Resolve a free-text query to a canonical key. 404 only when no catalog
/// data exists at all — with any catalog loaded, the fuzzy fallback always
/// yields some candidate.
async fn get_resolve(
    State(state): State<ApiState>,
    Query(params): Query<ResolveQuery>,
) -> Result<Json<ResolveResponse>, StatusCode> {
    refresh_quietly(&state.cache).await;
    let catalog = state.cache.catalog().await.ok_or(StatusCode::NOT_FOUND)?;
    let resolution = resolver::resolve(&params.q, &catalog).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(ResolveResponse {
        key: resolution.key,
        display_name: resolution.display_name,
    }))
}

/// The full price-command flow: resolve, quote, format.
async fn get_item(
    State(state): State<ApiState>,
    Query(params): Query<ResolveQuery>,
) -> Result<Json<ItemResponse>, StatusCode> {
    refresh_quietly(&state.cache).await;
    let catalog = state.cache.catalog().await.ok_or(StatusCode::NOT_FOUND)?;
    let resolution = resolver::resolve(&params.q, &catalog).ok_or(StatusCode::NOT_FOUND)?;

    let quote = state.cache.current_price(&resolution.key).await.unwrap_or_default();
    let fmt = PriceFormat::GroupedDecimal;
    Ok(Json(ItemResponse {
        formatted_name: format_item_name(&resolution.key),
        buy: quote.buy,
        sell: quote.sell,
        buy_formatted: quote.buy.map(|p| fmt.format(p)),
        sell_formatted: quote.sell.map(|p| fmt.format(p)),
        key: resolution.key,
        display_name: resolution.display_name,
    }))
}

/// Buy/sell history for charting. `days` defaults to the standard window
/// and is capped at retention — beyond that only sentinels exist.
async fn get_history(
    State(state): State<ApiState>,
    Path(key): Path<String>,
    Query(params): Query<HistoryQuery>,
) -> Json<HistorySeries> {
    let days = params
        .days
        .unwrap_or(DEFAULT_HISTORY_DAYS)
        .clamp(1, RETENTION_DAYS);
    Json(history::history(&state.store, &key, days).await)
}

/// Resolution against the wiki-enumerated op-item catalog.
async fn get_op_resolve(
    State(state): State<ApiState>,
    Query(params): Query<ResolveQuery>,
) -> Result<Json<OpItemResponse>, StatusCode> {
    if let Err(e) = state.wiki.ensure_fresh().await {
        warn!("wiki refresh failed during resolve: {e}");
    }
    let catalog = state.wiki.catalog().await.ok_or(StatusCode::NOT_FOUND)?;
    let resolution = resolver::resolve(&params.q, &catalog).ok_or(StatusCode::NOT_FOUND)?;
    let category = state.wiki.item(&resolution.key).await.map(|i| i.category);
    Ok(Json(OpItemResponse {
        key: resolution.key,
        display_name: resolution.display_name,
        category,
    }))
}

/// Queries never fail on upstream trouble — stale cache wins over errors.
async fn refresh_quietly(cache: &MarketCache) {
    if let Err(e) = cache.ensure_fresh().await {
        warn!("market refresh failed during query: {e}");
    }
}
