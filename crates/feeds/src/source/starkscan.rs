//! StarkScan contract event source.

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

/// Reads ERC20-style `Transfer` events from StarkScan.
#[derive(Debug, Clone)]
pub struct StarkScanSource {
    client: reqwest::Client,
    base_url: String,
    valuation: Valuation,
}

impl StarkScanSource {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.starkscan.co/api/v0";

    pub fn new(client: reqwest::Client, base_url: impl Into<String>, valuation: Valuation) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            valuation,
        }
    }
}

#[async_trait]
impl EventSource for StarkScanSource {
    fn name(&self) -> &'static str {
        "starkscan"
    }

    async fn fetch_events(
        &self,
        token_address: &str,
        limit: usize,
    ) -> Result<Vec<RawEvent>, FeedError> {
        let url = join_url(&self.base_url, &format!("contracts/{}/events", token_address));
        let body = get_json(&self.client, &url).await?;
        Ok(parse_events(&body, &self.valuation, limit))
    }
}

fn parse_events(body: &Value, valuation: &Valuation, limit: usize) -> Vec<RawEvent> {
    let Some(records) = body.get("data").and_then(Value::as_array) else {
        debug!("StarkScan: response has no data array");
        return Vec::new();
    };

    records
        .iter()
        .filter_map(|record| parse_event(record, valuation))
        .take(limit)
        .collect()
}

/// Parse one event record. Only transfers with a decodable amount are kept.
fn parse_event(record: &Value, valuation: &Valuation) -> Option<RawEvent> {
    if !str_field(record, "name").to_lowercase().contains("transfer") {
        return None;
    }

    // Transfer payload: [from, to, amount, ...]
    let data = record.get("data").and_then(Value::as_array)?;
    if data.len() < 3 {
        debug!("StarkScan: transfer event with short data array");
        return None;
    }

    let event_hash = str_field(record, "transaction_hash");
    if event_hash.is_empty() {
        debug!("StarkScan: transfer event without transaction hash");
        return None;
    }

    let raw_amount = match decode_amount(&data[2]) {
        Some(amount) => amount,
        None => {
            warn!(tx_hash = event_hash, amount = %data[2], "StarkScan: could not parse amount");
            return None;
        }
    };

    let amount_token = valuation.scale_raw(raw_amount);
    let timestamp = parse_timestamp(&record["timestamp"])
        .or_else(|| parse_timestamp(&record["block_timestamp"]))
        .unwrap_or_else(Utc::now);

    Some(RawEvent {
        event_hash: event_hash.to_string(),
        event_kind: EventKind::Buy,
        amount_quote: valuation.settlement_to_usd(amount_token),
        amount_base: amount_token,
        amount_token,
        quote_currency: valuation.settlement_symbol.clone(),
        timestamp,
        actor_identifier: data[1].as_str().unwrap_or("unknown").to_string(),
    })
}
