//! DexScreener market snapshot client.

use crate::error::FeedError;
use crate::parse::{coerce_f64, str_field};
use crate::rest::{get_json, join_url};
use buyalert_core::MarketSnapshot;
use chrono::Utc;
use compact_str::CompactString;
use serde_json::Value;
use tracing::debug;

/// Client for the DexScreener token endpoint.
#[derive(Debug, Clone)]
pub struct DexScreenerClient {
    client: reqwest::Client,
    base_url: String,
}

impl DexScreenerClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.dexscreener.com/latest/dex";

    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetch the snapshot of the pair best matching `venue_hint`.
    ///
    /// `token_address` must already be normalized. Returns `Ok(None)` when the
    /// token has no listed pairs.
    pub async fn fetch_snapshot(
        &self,
        token_address: &str,
        venue_hint: &str,
    ) -> Result<Option<MarketSnapshot>, FeedError> {
        let url = join_url(&self.base_url, &format!("tokens/{}", token_address));
        let body = get_json(&self.client, &url).await?;

        let pairs = match body.get("pairs").and_then(Value::as_array) {
            Some(pairs) => pairs,
            None => {
                debug!(token = token_address, "DexScreener: no pairs listed");
                return Ok(None);
            }
        };

        Ok(select_pair(pairs, venue_hint).map(snapshot_from_pair))
    }
}

/// Pick the first pair whose `dexId` contains `venue_hint` (case-insensitive),
/// falling back to the first pair.
pub fn select_pair<'a>(pairs: &'a [Value], venue_hint: &str) -> Option<&'a Value> {
    let venue = venue_hint.trim().to_lowercase();
    pairs
        .iter()
        .find(|pair| str_field(pair, "dexId").to_lowercase().contains(&venue))
        .or_else(|| pairs.first())
}

/// Convert a DexScreener pair object into a snapshot. Missing numbers become zero.
pub fn snapshot_from_pair(pair: &Value) -> MarketSnapshot {
    let base_token = &pair["baseToken"];
    MarketSnapshot {
        token_address: str_field(base_token, "address").to_string(),
        token_symbol: CompactString::new(str_field(base_token, "symbol")),
        price_usd: coerce_f64(&pair["priceUsd"]),
        market_cap: coerce_f64(&pair["marketCap"]),
        volume_24h: coerce_f64(&pair["volume"]["h24"]),
        price_change_24h: coerce_f64(&pair["priceChange"]["h24"]),
        liquidity_usd: coerce_f64(&pair["liquidity"]["usd"]),
        venue_id: str_field(pair, "dexId").to_string(),
        pair_address: str_field(pair, "pairAddress").to_string(),
        fetched_at: Utc::now(),
    }
}
