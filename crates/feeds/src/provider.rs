//! Provider adapter: one canonical view over all upstream sources.
//!
//! Snapshots come from DexScreener. Events come from an ordered chain of
//! [`EventSource`]s; the first source that yields at least one event wins.
//! Nothing here fails the caller: upstream errors are logged and treated as
//! "no data".

use crate::dexscreener::DexScreenerClient;
use crate::error::FeedError;
use crate::rest::{build_http_client, DEFAULT_REQUEST_TIMEOUT};
use crate::source::{EventSource, StarkScanSource, VoyagerSource};
use crate::valuation::Valuation;
use async_trait::async_trait;
use buyalert_core::{normalize_token_address, MarketSnapshot, RawEvent};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upper bound on events returned per token per call.
pub const DEFAULT_MAX_EVENTS: usize = 10;

/// Read access to token market data and recent events.
#[async_trait]
pub trait TokenDataProvider: Send + Sync {
    /// Current market snapshot, or `None` if no source has data.
    async fn fetch_market_snapshot(
        &self,
        token_address: &str,
        venue_hint: &str,
    ) -> Option<MarketSnapshot>;

    /// Recent events, possibly empty. Never fails.
    async fn fetch_recent_events(&self, token_address: &str, venue_hint: &str) -> Vec<RawEvent>;
}

/// Configuration for the provider adapter.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub dexscreener_url: String,
    pub starkscan_url: String,
    pub voyager_url: String,
    /// Timeout applied to every upstream request.
    pub request_timeout: Duration,
    /// Cap on events returned per call.
    pub max_events: usize,
    pub valuation: Valuation,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            dexscreener_url: DexScreenerClient::DEFAULT_BASE_URL.to_string(),
            starkscan_url: StarkScanSource::DEFAULT_BASE_URL.to_string(),
            voyager_url: VoyagerSource::DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_events: DEFAULT_MAX_EVENTS,
            valuation: Valuation::default(),
        }
    }
}

/// Adapter combining the snapshot client and the event source chain.
pub struct ProviderAdapter {
    snapshots: DexScreenerClient,
    sources: Vec<Box<dyn EventSource>>,
    max_events: usize,
}

impl ProviderAdapter {
    /// Build the default chain: StarkScan, then Voyager.
    pub fn new(config: ProviderConfig) -> Result<Self, FeedError> {
        let client = build_http_client(config.request_timeout)?;
        let snapshots = DexScreenerClient::new(client.clone(), config.dexscreener_url);
        let sources: Vec<Box<dyn EventSource>> = vec![
            Box::new(StarkScanSource::new(
                client.clone(),
                config.starkscan_url,
                config.valuation.clone(),
            )),
            Box::new(VoyagerSource::new(
                client,
                config.voyager_url,
                config.valuation,
            )),
        ];
        Ok(Self::with_sources(snapshots, sources, config.max_events))
    }

    /// Build an adapter over an explicit source chain, tried in order.
    pub fn with_sources(
        snapshots: DexScreenerClient,
        sources: Vec<Box<dyn EventSource>>,
        max_events: usize,
    ) -> Self {
        Self {
            snapshots,
            sources,
            max_events,
        }
    }

    /// Names of the event sources in fallback order.
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}

#[async_trait]
impl TokenDataProvider for ProviderAdapter {
    async fn fetch_market_snapshot(
        &self,
        token_address: &str,
        venue_hint: &str,
    ) -> Option<MarketSnapshot> {
        let address = normalize_token_address(token_address);
        if address != token_address {
            debug!(from = token_address, to = address, "Normalized token address");
        }

        match self.snapshots.fetch_snapshot(address, venue_hint).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(token = address, error = %e, "Failed to fetch market snapshot");
                None
            }
        }
    }

    async fn fetch_recent_events(&self, token_address: &str, _venue_hint: &str) -> Vec<RawEvent> {
        let address = normalize_token_address(token_address);

        for source in &self.sources {
            match source.fetch_events(address, self.max_events).await {
                Ok(mut events) if !events.is_empty() => {
                    events.truncate(self.max_events);
                    info!(
                        source = source.name(),
                        token = address,
                        count = events.len(),
                        "Fetched recent events"
                    );
                    return events;
                }
                Ok(_) => {
                    debug!(source = source.name(), token = address, "No events, trying next source");
                }
                Err(e) => {
                    warn!(
                        source = source.name(),
                        token = address,
                        error = %e,
                        transient = e.is_transient(),
                        "Event source failed, trying next source"
                    );
                }
            }
        }

        debug!(token = address, "No recent events from any source");
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buyalert_core::EventKind;
    use chrono::Utc;
    use compact_str::CompactString;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn event(hash: &str) -> RawEvent {
        RawEvent {
            event_hash: hash.to_string(),
            event_kind: EventKind::Buy,
            amount_quote: 10.0,
            amount_base: 0.01,
            amount_token: 100.0,
            quote_currency: CompactString::new("ETH"),
            timestamp: Utc::now(),
            actor_identifier: "0xbuyer".to_string(),
        }
    }

    enum Behaviour {
        Events(Vec<RawEvent>),
        Fail,
    }

    struct FakeSource {
        name: &'static str,
        behaviour: Behaviour,
        calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl EventSource for FakeSource {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch_events(
            &self,
            token_address: &str,
            _limit: usize,
        ) -> Result<Vec<RawEvent>, FeedError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.name, token_address));
            match &self.behaviour {
                Behaviour::Events(events) => Ok(events.clone()),
                Behaviour::Fail => Err(FeedError::HttpStatus(500)),
            }
        }
    }

    fn adapter(sources: Vec<(&'static str, Behaviour)>, calls: &Arc<Mutex<Vec<String>>>) -> ProviderAdapter {
        let client = build_http_client(DEFAULT_REQUEST_TIMEOUT).unwrap();
        let sources = sources
            .into_iter()
            .map(|(name, behaviour)| {
                Box::new(FakeSource {
                    name,
                    behaviour,
                    calls: Arc::clone(calls),
                }) as Box<dyn EventSource>
            })
            .collect();
        ProviderAdapter::with_sources(
            DexScreenerClient::new(client, "http://127.0.0.1:9"),
            sources,
            DEFAULT_MAX_EVENTS,
        )
    }

    #[tokio::test]
    async fn test_fallback_uses_second_source_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let b_events = vec![event("0x3"), event("0x1"), event("0x2")];
        let adapter = adapter(
            vec![("a", Behaviour::Events(vec![])), ("b", Behaviour::Events(b_events.clone()))],
            &calls,
        );

        let events = adapter.fetch_recent_events("0xabc-extra", "ekubo").await;
        assert_eq!(events, b_events);
        assert_eq!(*calls.lock().unwrap(), vec!["a:0xabc", "b:0xabc"]);
    }

    #[tokio::test]
    async fn test_first_non_empty_source_short_circuits() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let adapter = adapter(
            vec![
                ("a", Behaviour::Events(vec![event("0xa")])),
                ("b", Behaviour::Events(vec![event("0xb")])),
            ],
            &calls,
        );

        let events = adapter.fetch_recent_events("0xabc", "ekubo").await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_hash, "0xa");
        assert_eq!(*calls.lock().unwrap(), vec!["a:0xabc"]);
    }

    #[tokio::test]
    async fn test_failing_source_falls_through() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let adapter = adapter(
            vec![("a", Behaviour::Fail), ("b", Behaviour::Events(vec![event("0xb")]))],
            &calls,
        );
        let events = adapter.fetch_recent_events("0xabc", "ekubo").await;
        assert_eq!(events[0].event_hash, "0xb");
    }

    #[tokio::test]
    async fn test_all_sources_empty_returns_empty() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let adapter = adapter(
            vec![("a", Behaviour::Fail), ("b", Behaviour::Events(vec![]))],
            &calls,
        );
        assert!(adapter.fetch_recent_events("0xabc", "ekubo").await.is_empty());
    }

    #[tokio::test]
    async fn test_results_are_capped() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let many: Vec<_> = (0..15).map(|i| event(&format!("0x{}", i))).collect();
        let adapter = adapter(vec![("a", Behaviour::Events(many))], &calls);
        let events = adapter.fetch_recent_events("0xabc", "ekubo").await;
        assert_eq!(events.len(), DEFAULT_MAX_EVENTS);
        assert_eq!(events[0].event_hash, "0x0");
    }

    #[tokio::test]
    async fn test_http_500_everywhere_yields_no_data() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", mockito::Matcher::Any)
            .with_status(500)
            .expect_at_least(1)
            .create_async()
            .await;

        let config = ProviderConfig {
            dexscreener_url: server.url(),
            starkscan_url: server.url(),
            voyager_url: server.url(),
            ..Default::default()
        };
        let adapter = ProviderAdapter::new(config).unwrap();
        assert_eq!(adapter.source_names(), vec!["starkscan", "voyager"]);

        assert!(adapter.fetch_recent_events("0xabc", "ekubo").await.is_empty());
        assert!(adapter.fetch_market_snapshot("0xabc", "ekubo").await.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_uses_normalized_address() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/tokens/0xabc")
            .with_status(200)
            .with_body(json!({"pairs": [{"dexId": "ekubo", "priceUsd": "0.5"}]}).to_string())
            .create_async()
            .await;

        let config = ProviderConfig {
            dexscreener_url: server.url(),
            ..Default::default()
        };
        let adapter = ProviderAdapter::new(config).unwrap();
        let snapshot = adapter
            .fetch_market_snapshot("0xabc-ekubo-pool", "Ekubo")
            .await
            .unwrap();
        assert_eq!(snapshot.price_usd, 0.5);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_starkscan_failure_falls_back_to_voyager_over_http() {
        let mut starkscan = mockito::Server::new_async().await;
        starkscan
            .mock("GET", "/contracts/0xabc/events")
            .with_status(503)
            .create_async()
            .await;

        let mut voyager = mockito::Server::new_async().await;
        voyager
            .mock("GET", "/txns")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                json!({"items": [
                    {"type": "transfer", "hash": "0xv1", "amount": 1000},
                    {"type": "transfer", "hash": "0xv2", "amount": "bad"},
                    {"type": "transfer", "hash": "0xv3", "amount": "0x64"}
                ]})
                .to_string(),
            )
            .create_async()
            .await;

        let config = ProviderConfig {
            starkscan_url: starkscan.url(),
            voyager_url: voyager.url(),
            ..Default::default()
        };
        let adapter = ProviderAdapter::new(config).unwrap();
        let events = adapter.fetch_recent_events("0xabc", "ekubo").await;
        let hashes: Vec<_> = events.iter().map(|e| e.event_hash.as_str()).collect();
        assert_eq!(hashes, vec!["0xv1", "0xv3"]);
        assert_eq!(events[1].amount_token, 100.0);
    }
}
