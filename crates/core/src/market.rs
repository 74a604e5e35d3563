//! Market data snapshots.

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Current market state of a token on one trading pair.
///
/// Numeric fields are zero when the upstream source omitted them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub token_address: String,
    pub token_symbol: CompactString,
    pub price_usd: f64,
    pub market_cap: f64,
    pub volume_24h: f64,
    pub price_change_24h: f64,
    pub liquidity_usd: f64,
    /// Venue identifier as reported upstream (e.g. "ekubo").
    pub venue_id: String,
    pub pair_address: String,
    pub fetched_at: DateTime<Utc>,
}
