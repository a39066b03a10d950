//! Wiki item enumeration: the alternate catalog source.
//!
//! Item identity comes from image asset filenames on per-category wiki
//! pages. The parsed catalog is cached in `op_items.json` under the same
//! hourly staleness discipline as the market cache.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{Config, WIKI_CATEGORIES};
use crate::error::Result;
use crate::format::format_item_name;
use crate::types::{Catalog, CatalogEntry};

/// One item enumerated from a wiki category page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiItem {
    /// Canonical key: the percent-decoded asset filename stem, lowercased.
    pub key: String,
    pub display_name: String,
    /// Category with umlauts restored, e.g. `ruestungen` → `rüstungen`.
    pub category: String,
}

/// Undo the ASCII transliteration in wiki URL slugs.
pub fn restore_umlauts(slug: &str) -> String {
    slug.replace("ue", "ü").replace("oe", "ö").replace("ae", "ä")
}

/// Extract items from one category page: every `img` whose `src` points
/// into the op asset tree names an item by its filename.
pub fn parse_category_page(html: &str, category: &str) -> Vec<WikiItem> {
    let Ok(img) = Selector::parse("img") else {
        return Vec::new();
    };
    let category = restore_umlauts(category);

    let doc = Html::parse_document(html);
    let mut items = Vec::new();
    for el in doc.select(&img) {
        let Some(src) = el.value().attr("src") else { continue };
        if !src.contains("assets/op") {
            continue;
        }
        let Some(filename) = src.rsplit('/').next() else { continue };
        let stem = filename.strip_suffix(".png").unwrap_or(filename);
        let decoded = urlencoding::decode(stem)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| stem.to_string());
        if decoded.is_empty() {
            continue;
        }
        items.push(WikiItem {
            key: decoded.to_lowercase(),
            display_name: format_item_name(&decoded),
            category: category.clone(),
        });
    }
    items
}

// ---------------------------------------------------------------------------
// WikiCache
// ---------------------------------------------------------------------------

/// Persisted form of the wiki catalog.
#[derive(Debug, Default, Serialize, Deserialize)]
struct WikiCacheFile {
    last_refresh_secs: u64,
    items: Vec<WikiItem>,
}

#[derive(Default)]
struct WikiState {
    loaded: bool,
    last_refresh_secs: u64,
    items: Option<Arc<Vec<WikiItem>>>,
    catalog: Option<Arc<Catalog>>,
}

pub struct WikiCache {
    cfg: Config,
    client: reqwest::Client,
    /// Same single-flight discipline as the market cache: the mutex is held
    /// across the scrape so only one refresh is ever in flight.
    state: Mutex<WikiState>,
}

impl WikiCache {
    pub fn new(cfg: Config) -> Result<Arc<Self>> {
        let client = crate::fetch::build_client(&cfg)?;
        Ok(Arc::new(Self { cfg, client, state: Mutex::new(WikiState::default()) }))
    }

    fn cache_path(&self) -> PathBuf {
        PathBuf::from(&self.cfg.data_dir).join("op_items.json")
    }

    /// Re-scrape the wiki when the cached item list is absent or older than
    /// the refresh interval. Failures keep stale data and do not advance
    /// the timestamp.
    pub async fn ensure_fresh(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.loaded {
            self.load_from_disk(&mut state).await;
            state.loaded = true;
        }

        let now = now_secs();
        if state.items.is_some()
            && now.saturating_sub(state.last_refresh_secs) <= self.cfg.refresh_interval_secs
        {
            return Ok(());
        }

        let items = self.scrape().await;
        if items.is_empty() {
            // Total scrape failure — keep whatever we had.
            warn!("wiki scrape produced no items, serving stale catalog");
            return Ok(());
        }

        let file = WikiCacheFile { last_refresh_secs: now, items };
        if let Err(e) = self.persist(&file).await {
            warn!("failed to persist wiki cache: {e}");
        }
        info!(items = file.items.len(), "wiki catalog refreshed");
        self.install(&mut state, file.items, now);
        Ok(())
    }

    /// The wiki catalog for resolution; None until a scrape or disk load
    /// has succeeded.
    pub async fn catalog(&self) -> Option<Arc<Catalog>> {
        let mut state = self.state.lock().await;
        if !state.loaded {
            self.load_from_disk(&mut state).await;
            state.loaded = true;
        }
        state.catalog.clone()
    }

    /// Item metadata lookup by canonical key.
    pub async fn item(&self, key: &str) -> Option<WikiItem> {
        let state = self.state.lock().await;
        let items = state.items.as_ref()?;
        items.iter().find(|i| i.key == key).cloned()
    }

    async fn scrape(&self) -> Vec<WikiItem> {
        let mut all = Vec::new();
        for category in WIKI_CATEGORIES {
            let url = format!("{}/op/{}/", self.cfg.wiki_base_url, category);
            let html = match self.fetch_page(&url).await {
                Ok(h) => h,
                Err(e) => {
                    // One unreachable category page does not fail the scrape.
                    warn!(category, "wiki page fetch failed: {e}");
                    continue;
                }
            };
            let items = parse_category_page(&html, category);
            debug!(category, items = items.len(), "wiki category parsed");
            all.extend(items);
        }
        all
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(crate::error::AppError::Upstream(format!(
                "GET {url} returned {}",
                resp.status()
            )));
        }
        Ok(resp.text().await?)
    }

    async fn load_from_disk(&self, state: &mut WikiState) {
        let file = match tokio::fs::read(self.cache_path()).await {
            Ok(bytes) => match serde_json::from_slice::<WikiCacheFile>(&bytes) {
                Ok(f) => f,
                Err(e) => {
                    warn!("malformed wiki cache on disk, forcing refresh: {e}");
                    return;
                }
            },
            Err(_) => return,
        };
        let last = file.last_refresh_secs;
        self.install(state, file.items, last);
    }

    fn install(&self, state: &mut WikiState, items: Vec<WikiItem>, last_refresh_secs: u64) {
        let entries = items
            .iter()
            .map(|i| CatalogEntry {
                key: i.key.clone(),
                display_name: Some(i.display_name.clone()),
            })
            .collect();
        state.catalog = Some(Arc::new(Catalog::new(entries)));
        state.items = Some(Arc::new(items));
        state.last_refresh_secs = last_refresh_secs;
    }

    async fn persist(&self, file: &WikiCacheFile) -> Result<()> {
        tokio::fs::create_dir_all(&self.cfg.data_dir).await?;
        tokio::fs::write(self.cache_path(), serde_json::to_vec(file)?).await?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"
        <html><body>
          <img src="/theme/logo.png">
          <img src="/assets/op/item/schwerter/Legend%C3%A4res_Schwert.png">
          <img src="/assets/op/item/schwerter/Katana.png">
        </body></html>
    "#;

    #[test]
    fn parses_op_asset_images_only() {
        let items = parse_category_page(PAGE, "schwerter");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].key, "legendäres_schwert");
        assert_eq!(items[0].display_name, "Legendäres Schwert");
        assert_eq!(items[1].key, "katana");
    }

    #[test]
    fn category_umlauts_are_restored() {
        assert_eq!(restore_umlauts("ruestungen"), "rüstungen");
        assert_eq!(restore_umlauts("aexte"), "äxte");
        assert_eq!(restore_umlauts("boegen"), "bögen");
        assert_eq!(restore_umlauts("spitzhacken"), "spitzhacken");
        let items = parse_category_page(PAGE, "armbrueste");
        assert!(items.iter().all(|i| i.category == "armbrüste"));
    }

    #[test]
    fn empty_page_parses_to_no_items() {
        assert!(parse_category_page("<html></html>", "schwerter").is_empty());
    }

    fn test_config(base: &str, data_dir: &str) -> Config {
        Config {
            market_api_url: String::new(),
            wiki_base_url: base.to_string(),
            log_level: "info".to_string(),
            data_dir: data_dir.to_string(),
            api_port: 0,
            api_user: "tester".to_string(),
            api_key: "secret".to_string(),
            refresh_interval_secs: 3600,
            retention_days: 30,
        }
    }

    #[tokio::test]
    async fn scrape_runs_once_while_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start().await;
        // One request per category page, across BOTH ensure_fresh calls.
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .expect(WIKI_CATEGORIES.len() as u64)
            .mount(&server)
            .await;

        let cfg = test_config(&server.uri(), dir.path().to_str().unwrap());
        let cache = WikiCache::new(cfg).unwrap();
        cache.ensure_fresh().await.unwrap();
        cache.ensure_fresh().await.unwrap();

        let catalog = cache.catalog().await.unwrap();
        // The same page served for every category dedupes to two keys.
        assert_eq!(catalog.len(), 2);
        assert!(dir.path().join("op_items.json").exists());

        let item = cache.item("katana").await.unwrap();
        assert_eq!(item.display_name, "Katana");
    }

    #[tokio::test]
    async fn cache_file_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .expect(WIKI_CATEGORIES.len() as u64)
            .mount(&server)
            .await;

        let cfg = test_config(&server.uri(), dir.path().to_str().unwrap());
        let cache = WikiCache::new(cfg.clone()).unwrap();
        cache.ensure_fresh().await.unwrap();
        drop(cache);

        // Second instance loads from disk; still fresh, so no new requests.
        let cache = WikiCache::new(cfg).unwrap();
        cache.ensure_fresh().await.unwrap();
        assert!(cache.catalog().await.is_some());
    }
}
