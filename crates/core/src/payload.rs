//! Fully computed alert contents.

use crate::DestinationConfig;
use crate::{MarketSnapshot, RawEvent};
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Everything a renderer needs to describe one buy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    /// Spent amount in the quote currency (USD).
    pub spent_quote: f64,
    /// Spent amount in the settlement asset.
    pub spent_base: f64,
    pub base_currency: CompactString,
    pub bought_amount: f64,
    /// Share of total supply bought, in percent.
    pub supply_percentage: f64,
    pub price_usd: f64,
    pub market_cap: f64,
    pub total_supply: u64,
    /// Estimated holder count, when a source is available.
    pub holder_count: Option<u64>,
    pub event_hash: String,
    pub timestamp: DateTime<Utc>,
    pub token_symbol: CompactString,
}

/// Percentage of `total_supply` represented by `amount_token`; zero for an empty supply.
pub fn supply_percentage(amount_token: f64, total_supply: u64) -> f64 {
    if total_supply > 0 {
        amount_token / total_supply as f64 * 100.0
    } else {
        0.0
    }
}

impl AlertPayload {
    /// Combine an event, a market snapshot and the destination config.
    pub fn build(
        event: &RawEvent,
        snapshot: &MarketSnapshot,
        config: &DestinationConfig,
        holder_count: Option<u64>,
    ) -> Self {
        Self {
            spent_quote: event.amount_quote,
            spent_base: event.amount_base,
            base_currency: event.quote_currency.clone(),
            bought_amount: event.amount_token,
            supply_percentage: supply_percentage(event.amount_token, config.total_supply),
            price_usd: snapshot.price_usd,
            market_cap: snapshot.market_cap,
            total_supply: config.total_supply,
            holder_count,
            event_hash: event.event_hash.clone(),
            timestamp: event.timestamp,
            token_symbol: config.token_symbol.clone(),
        }
    }
}
