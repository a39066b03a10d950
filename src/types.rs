use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// One item in the loaded catalog. `key` is the stable, language-independent
/// identifier used for every lookup; `display_name` is the localized form
/// shown to users, when the source carries one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub key: String,
    pub display_name: Option<String>,
}

/// The item catalog, replaced wholesale on every refresh.
///
/// Entries keep upstream document order — resolver tie-breaks are
/// "first encountered during iteration", so iteration order is part of the
/// observable behavior and must stay insertion-stable (not alphabetical).
///
/// Serializes as a key → display-name object, the same document shape
/// `from_value` accepts, so the persisted cache file round-trips.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Serialize for Catalog {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for e in &self.entries {
            map.serialize_entry(&e.key, &e.display_name)?;
        }
        map.end()
    }
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let entries = entries
            .into_iter()
            .filter(|e| seen.insert(e.key.clone()))
            .collect();
        Self { entries }
    }

    pub fn from_keys(keys: Vec<String>) -> Self {
        Self::new(
            keys.into_iter()
                .map(|key| CatalogEntry { key, display_name: None })
                .collect(),
        )
    }

    /// Accepts both observed shapes of the upstream catalog document:
    /// a bare JSON array of key strings, or an object of key → display name.
    pub fn from_value(v: &serde_json::Value) -> Option<Self> {
        if let Some(arr) = v.as_array() {
            let keys = arr
                .iter()
                .filter_map(|x| x.as_str().map(str::to_string))
                .collect();
            return Some(Self::from_keys(keys));
        }
        if let Some(obj) = v.as_object() {
            let entries = obj
                .iter()
                .map(|(key, name)| CatalogEntry {
                    key: key.clone(),
                    display_name: name.as_str().map(str::to_string),
                })
                .collect();
            return Some(Self::new(entries));
        }
        None
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

// ---------------------------------------------------------------------------
// Prices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// One side's price for one item within one snapshot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PricePoint {
    #[serde(rename = "orderSide")]
    pub order_side: OrderSide,
    pub price: f64,
}

/// category → item key → price points. At most one BUY and one SELL per item
/// are meaningful; duplicate sides resolve last-write-wins in `from_points`.
pub type PriceSnapshot = HashMap<String, HashMap<String, Vec<PricePoint>>>;

/// Current buy/sell prices for one item. Either side may be absent.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PriceQuote {
    pub buy: Option<f64>,
    pub sell: Option<f64>,
}

impl PriceQuote {
    /// Collapse a point list into a quote. Later points win per side.
    pub fn from_points(points: &[PricePoint]) -> Self {
        let mut quote = PriceQuote::default();
        for p in points {
            match p.order_side {
                OrderSide::Buy => quote.buy = Some(p.price),
                OrderSide::Sell => quote.sell = Some(p.price),
            }
        }
        quote
    }
}

/// Look up an item across all categories of a snapshot.
/// Returns None when the key appears in no category.
pub fn quote_from(snapshot: &PriceSnapshot, key: &str) -> Option<PriceQuote> {
    for items in snapshot.values() {
        if let Some(points) = items.get(key) {
            return Some(PriceQuote::from_points(points));
        }
    }
    None
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Aligned per-day series for charting. All three vectors have identical
/// length. A value of 0.0 means "no data for that day/side", not a free
/// price — renderers must treat 0 as unknown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySeries {
    pub dates: Vec<String>,
    pub buy: Vec<f64>,
    pub sell: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
