//! Alert metrics calculation.

use async_trait::async_trait;
use buyalert_core::{AlertPayload, DestinationConfig, RawEvent};
use buyalert_feeds::TokenDataProvider;
use std::sync::Arc;
use tracing::{debug, warn};

/// Token data that no event or snapshot source provides yet.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Estimated number of holders of the token.
    async fn holder_count(&self, token_address: &str) -> Option<u64>;
}

/// Fixed values from configuration, standing in for an on-chain indexer.
#[derive(Debug, Clone, Default)]
pub struct StaticMarketData {
    holder_count: Option<u64>,
}

impl StaticMarketData {
    pub fn new(holder_count: Option<u64>) -> Self {
        Self { holder_count }
    }
}

#[async_trait]
impl MarketDataSource for StaticMarketData {
    async fn holder_count(&self, _token_address: &str) -> Option<u64> {
        self.holder_count
    }
}

/// Builds alert payloads from raw events and fresh market data.
#[derive(Clone)]
pub struct MetricsCalculator {
    provider: Arc<dyn TokenDataProvider>,
    market_data: Arc<dyn MarketDataSource>,
}

impl MetricsCalculator {
    pub fn new(provider: Arc<dyn TokenDataProvider>, market_data: Arc<dyn MarketDataSource>) -> Self {
        Self {
            provider,
            market_data,
        }
    }

    /// Compute the payload for one event.
    ///
    /// Returns `None` when no market snapshot is available; the event must then
    /// be skipped rather than alerted with partial data.
    pub async fn compute(
        &self,
        event: &RawEvent,
        config: &DestinationConfig,
    ) -> Option<AlertPayload> {
        let address = config.canonical_address();
        let Some(snapshot) = self
            .provider
            .fetch_market_snapshot(address, &config.venue_name)
            .await
        else {
            warn!(
                token = address,
                tx_hash = %event.event_hash,
                "No market snapshot, cannot compute alert"
            );
            return None;
        };

        let holder_count = self.market_data.holder_count(address).await;
        let payload = AlertPayload::build(event, &snapshot, config, holder_count);
        debug!(
            tx_hash = %payload.event_hash,
            spent_quote = payload.spent_quote,
            supply_pct = payload.supply_percentage,
            price = payload.price_usd,
            "Computed alert metrics"
        );
        Some(payload)
    }
}
