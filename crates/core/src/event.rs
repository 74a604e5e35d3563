//! Candidate purchase events observed from upstream sources.

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Classification of an upstream record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Buy,
    Other,
}

/// One candidate purchase, produced by a provider and consumed once by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Transaction hash, used as the dedup key.
    pub event_hash: String,
    pub event_kind: EventKind,
    /// Notional value in the quote currency (USD).
    pub amount_quote: f64,
    /// Amount paid, denominated in `quote_currency`.
    pub amount_base: f64,
    /// Tokens received.
    pub amount_token: f64,
    /// Symbol of the asset `amount_base` is paid in (e.g. "ETH").
    pub quote_currency: CompactString,
    pub timestamp: DateTime<Utc>,
    /// Buyer address, or "unknown".
    pub actor_identifier: String,
}

impl RawEvent {
    #[inline]
    pub fn is_buy(&self) -> bool {
        self.event_kind == EventKind::Buy
    }
}
