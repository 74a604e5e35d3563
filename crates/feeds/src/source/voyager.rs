//! Voyager transfer listing source.

use super::EventSource;
use crate::error::FeedError;
use crate::parse::{decode_amount, parse_timestamp, str_field};
use crate::rest::{get_json, join_url};
use crate::valuation::Valuation;
use async_trait::async_trait;
use buyalert_core::{EventKind, RawEvent};
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

/// Reads token transfers from the Voyager explorer API.
#[derive(Debug, Clone)]
pub struct VoyagerSource {
    client: reqwest::Client,
    base_url: String,
    valuation: Valuation,
}

impl VoyagerSource {
    pub const DEFAULT_BASE_URL: &'static str = "https://voyager.online/api";

    pub fn new(client: reqwest::Client, base_url: impl Into<String>, valuation: Valuation) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            valuation,
        }
    }
}

#[async_trait]
impl EventSource for VoyagerSource {
    fn name(&self) -> &'static str {
        "voyager"
    }

    async fn fetch_events(
        &self,
        token_address: &str,
        limit: usize,
    ) -> Result<Vec<RawEvent>, FeedError> {
        let url = join_url(
            &self.base_url,
            &format!("txns?contract={}&type=transfer&ps={}", token_address, limit),
        );
        let body = get_json(&self.client, &url).await?;
        Ok(parse_items(&body, &self.valuation, limit))
    }
}

fn parse_items(body: &Value, valuation: &Valuation, limit: usize) -> Vec<RawEvent> {
    let Some(items) = body.get("items").and_then(Value::as_array) else {
        debug!("Voyager: response has no items array");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| parse_item(item, valuation))
        .take(limit)
        .collect()
}

/// Parse one listing entry. Amounts here are already in token units.
fn parse_item(item: &Value, valuation: &Valuation) -> Option<RawEvent> {
    if !str_field(item, "type").eq_ignore_ascii_case("transfer") {
        return None;
    }

    let event_hash = str_field(item, "hash");
    if event_hash.is_empty() {
        debug!("Voyager: transfer without hash");
        return None;
    }

    let amount_token = match decode_amount(&item["amount"]) {
        Some(amount) => amount,
        None => {
            warn!(tx_hash = event_hash, amount = %item["amount"], "Voyager: could not parse amount");
            return None;
        }
    };

    let amount_quote = amount_token * valuation.fallback_unit_usd;
    let actor = match str_field(item, "from_address") {
        "" => "unknown",
        addr => addr,
    };

    Some(RawEvent {
        event_hash: event_hash.to_string(),
        event_kind: EventKind::Buy,
        amount_quote,
        amount_base: valuation.usd_to_settlement(amount_quote),
        amount_token,
        quote_currency: valuation.settlement_symbol.clone(),
        timestamp: parse_timestamp(&item["timestamp"]).unwrap_or_else(Utc::now),
        actor_identifier: actor.to_string(),
    })
}
