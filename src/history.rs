//! Price-history aggregation over the daily snapshot archive.

use chrono::Utc;

use crate::store::DailySnapshotStore;
use crate::store::daily::DATE_FMT;
use crate::types::{HistorySeries, PriceQuote, quote_from};

/// Build the aligned buy/sell series for `key` over the most recent
/// `window_days` calendar dates, `[today - (window_days - 1), today]`
/// ascending.
///
/// Every vector is exactly `window_days` long no matter how much data the
/// archive holds. A day with no snapshot, or a snapshot without the item or
/// without one side, contributes the 0.0 sentinel at that index — "no
/// data", not a free price.
pub async fn history(
    store: &DailySnapshotStore,
    key: &str,
    window_days: u32,
) -> HistorySeries {
    let today = Utc::now().date_naive();
    let window = window_days.max(1);

    let mut series = HistorySeries {
        dates: Vec::with_capacity(window as usize),
        buy: Vec::with_capacity(window as usize),
        sell: Vec::with_capacity(window as usize),
    };

    for back in (0..window).rev() {
        let date = today - chrono::Days::new(u64::from(back));
        let quote = match store.read(date).await {
            Some(snapshot) => quote_from(&snapshot, key).unwrap_or_default(),
            None => PriceQuote::default(),
        };

        series.dates.push(date.format(DATE_FMT).to_string());
        series.buy.push(quote.buy.unwrap_or(0.0));
        series.sell.push(quote.sell.unwrap_or(0.0));
    }

    series
}
