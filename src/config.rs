use crate::error::{AppError, Result};

pub const MARKET_API_URL: &str = "https://api.opsucht.net/market";
pub const WIKI_BASE_URL: &str = "https://wiki.opsucht.net";

/// How long a cached catalog/price snapshot stays fresh (seconds).
pub const REFRESH_INTERVAL_SECS: u64 = 3600;

/// Daily snapshots strictly older than this many days are pruned.
pub const RETENTION_DAYS: u32 = 30;

/// Default charting window when the caller does not ask for one.
pub const DEFAULT_HISTORY_DAYS: u32 = 14;

/// Upstream request timeout (seconds). The reference behavior had none;
/// a stalled upstream must surface as a fetch failure, not hang a refresh.
pub const FETCH_TIMEOUT_SECS: u64 = 30;

/// Wiki category pages enumerated for the op-item catalog.
pub const WIKI_CATEGORIES: &[&str] = &[
    "spitzhacken",
    "schwerter",
    "aexte",
    "schaufeln",
    "hacken",
    "ruestungen",
    "schilde",
    "boegen",
    "armbrueste",
    "angeln",
    "talismane",
    "fluegel",
    "plueschtiere",
    "sonstiges",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub market_api_url: String,
    pub wiki_base_url: String,
    pub log_level: String,
    /// Directory holding items.json, prices.json, refresh.json and daily/.
    pub data_dir: String,
    pub api_port: u16,
    /// Basic-auth username for the market API (MARKET_API_USER).
    pub api_user: String,
    /// Basic-auth key for the market API (MARKET_API_KEY).
    pub api_key: String,
    pub refresh_interval_secs: u64,
    pub retention_days: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            market_api_url: std::env::var("MARKET_API_URL")
                .unwrap_or_else(|_| MARKET_API_URL.to_string()),
            wiki_base_url: std::env::var("WIKI_BASE_URL")
                .unwrap_or_else(|_| WIKI_BASE_URL.to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            api_user: std::env::var("MARKET_API_USER")
                .map_err(|_| AppError::Config("MARKET_API_USER must be set".to_string()))?,
            api_key: std::env::var("MARKET_API_KEY")
                .map_err(|_| AppError::Config("MARKET_API_KEY must be set".to_string()))?,
            refresh_interval_secs: std::env::var("REFRESH_INTERVAL_SECS")
                .unwrap_or_else(|_| REFRESH_INTERVAL_SECS.to_string())
                .parse::<u64>()
                .unwrap_or(REFRESH_INTERVAL_SECS),
            retention_days: std::env::var("RETENTION_DAYS")
                .unwrap_or_else(|_| RETENTION_DAYS.to_string())
                .parse::<u32>()
                .unwrap_or(RETENTION_DAYS),
        })
    }
}
