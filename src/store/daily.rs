//! Append-only archive of one price snapshot per calendar date.
//!
//! One JSON file per date under `{data_dir}/daily/`, named `DD-MM-YYYY.json`.
//! The store exclusively owns this directory and its retention.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::types::PriceSnapshot;

/// Filename date form, e.g. `03-11-2025`.
pub const DATE_FMT: &str = "%d-%m-%Y";

pub struct DailySnapshotStore {
    dir: PathBuf,
    /// Read memo for strictly-past dates. Past days are immutable once
    /// written, so a hit never goes stale; today is always read from disk
    /// because the archive cycle may overwrite it.
    memo: DashMap<NaiveDate, Arc<PriceSnapshot>>,
}

impl DailySnapshotStore {
    pub fn new(data_dir: &str) -> Arc<Self> {
        Arc::new(Self {
            dir: PathBuf::from(data_dir).join("daily"),
            memo: DashMap::new(),
        })
    }

    fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.json", date.format(DATE_FMT)))
    }

    /// Serialize `snapshot` into today's slot. Overwrites an existing
    /// same-day file — idempotent per day, not cumulative.
    pub async fn write_today(&self, snapshot: &PriceSnapshot) -> Result<()> {
        self.write(Utc::now().date_naive(), snapshot).await
    }

    pub async fn write(&self, date: NaiveDate, snapshot: &PriceSnapshot) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.path_for(date), serde_json::to_vec(snapshot)?).await?;
        self.memo.remove(&date);
        debug!(date = %date.format(DATE_FMT), "daily snapshot written");
        Ok(())
    }

    /// Read the snapshot for `date`. None means "no data for that day" —
    /// absent file and malformed file alike. Callers must not conflate this
    /// with a zero price.
    pub async fn read(&self, date: NaiveDate) -> Option<Arc<PriceSnapshot>> {
        let today = Utc::now().date_naive();
        if date < today {
            if let Some(hit) = self.memo.get(&date) {
                return Some(Arc::clone(&hit));
            }
        }

        let bytes = tokio::fs::read(self.path_for(date)).await.ok()?;
        let snapshot: PriceSnapshot = match serde_json::from_slice(&bytes) {
            Ok(s) => s,
            Err(e) => {
                warn!(date = %date.format(DATE_FMT), "malformed daily snapshot: {e}");
                return None;
            }
        };

        let snapshot = Arc::new(snapshot);
        if date < today {
            self.memo.insert(date, Arc::clone(&snapshot));
        }
        Some(snapshot)
    }

    /// Delete every stored date strictly older than `retention_days`
    /// relative to today. Best-effort: individual failures are logged and
    /// skipped, never fatal.
    pub async fn prune_older_than(&self, retention_days: u32) {
        let today = Utc::now().date_naive();
        let cutoff = today - chrono::Days::new(u64::from(retention_days));

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(e) => e,
            // Directory absent simply means nothing archived yet.
            Err(_) => return,
        };

        let mut removed = 0usize;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            let Ok(date) = NaiveDate::parse_from_str(stem, DATE_FMT) else {
                continue;
            };
            if date < cutoff {
                match tokio::fs::remove_file(entry.path()).await {
                    Ok(()) => {
                        self.memo.remove(&date);
                        removed += 1;
                    }
                    Err(e) => warn!(date = %stem, "failed to prune daily snapshot: {e}"),
                }
            }
        }

        if removed > 0 {
            info!(removed, retention_days, "pruned daily snapshots");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderSide, PricePoint};
    use std::collections::HashMap;

    fn snapshot_with(key: &str, buy: f64) -> PriceSnapshot {
        let mut items = HashMap::new();
        items.insert(
            key.to_string(),
            vec![PricePoint { order_side: OrderSide::Buy, price: buy }],
        );
        let mut snap = PriceSnapshot::new();
        snap.insert("weapons".to_string(), items);
        snap
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = DailySnapshotStore::new(dir.path().to_str().unwrap());
        let snap = snapshot_with("diamond_sword", 1500.0);

        store.write_today(&snap).await.unwrap();
        let read = store.read(Utc::now().date_naive()).await.unwrap();

        let quote = crate::types::quote_from(&read, "diamond_sword").unwrap();
        assert_eq!(quote.buy, Some(1500.0));
    }

    #[tokio::test]
    async fn same_day_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = DailySnapshotStore::new(dir.path().to_str().unwrap());
        let today = Utc::now().date_naive();

        store.write(today, &snapshot_with("stone", 1.0)).await.unwrap();
        store.write(today, &snapshot_with("stone", 2.0)).await.unwrap();

        let read = store.read(today).await.unwrap();
        let quote = crate::types::quote_from(&read, "stone").unwrap();
        assert_eq!(quote.buy, Some(2.0));
    }

    #[tokio::test]
    async fn missing_date_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = DailySnapshotStore::new(dir.path().to_str().unwrap());
        let read = store.read(Utc::now().date_naive()).await;
        assert!(read.is_none());
    }

    #[tokio::test]
    async fn malformed_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = DailySnapshotStore::new(dir.path().to_str().unwrap());
        let today = Utc::now().date_naive();

        std::fs::create_dir_all(dir.path().join("daily")).unwrap();
        std::fs::write(
            dir.path().join("daily").join(format!("{}.json", today.format(DATE_FMT))),
            b"{broken",
        )
        .unwrap();

        assert!(store.read(today).await.is_none());
    }

    #[tokio::test]
    async fn prune_keeps_retention_window() {
        let dir = tempfile::tempdir().unwrap();
        let store = DailySnapshotStore::new(dir.path().to_str().unwrap());
        let today = Utc::now().date_naive();
        let old = today - chrono::Days::new(31);
        let recent = today - chrono::Days::new(29);

        store.write(old, &snapshot_with("stone", 1.0)).await.unwrap();
        store.write(recent, &snapshot_with("stone", 1.0)).await.unwrap();

        store.prune_older_than(30).await;

        assert!(store.read(old).await.is_none());
        assert!(store.read(recent).await.is_some());
    }

    #[tokio::test]
    async fn filenames_use_day_month_year() {
        let dir = tempfile::tempdir().unwrap();
        let store = DailySnapshotStore::new(dir.path().to_str().unwrap());
        let date = NaiveDate::from_ymd_opt(2025, 11, 3).unwrap();

        store.write(date, &snapshot_with("stone", 1.0)).await.unwrap();

        assert!(dir.path().join("daily").join("03-11-2025.json").exists());
    }
}
