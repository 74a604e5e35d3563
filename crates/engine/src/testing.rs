//! In-memory fakes shared by the engine tests.

use crate::delivery::AlertSink;
use crate::dedup::DedupStore;
use crate::error::{DeliveryError, StoreError, StoreResult};
use crate::registry::DestinationRegistry;
use async_trait::async_trait;
use buyalert_core::{
    AlertPayload, DestinationConfig, DestinationId, EventKind, MarketSnapshot, RawEvent,
};
use buyalert_feeds::TokenDataProvider;
use chrono::Utc;
use compact_str::CompactString;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn destination(id: &str, threshold: f64) -> DestinationConfig {
    DestinationConfig::new(id, "0xabc-pool", "SLAY", "Ekubo", 1_000_000, threshold)
}

pub fn buy_event(hash: &str, amount_quote: f64, amount_token: f64) -> RawEvent {
    RawEvent {
        event_hash: hash.to_string(),
        event_kind: EventKind::Buy,
        amount_quote,
        amount_base: amount_quote / 3700.0,
        amount_token,
        quote_currency: CompactString::new("ETH"),
        timestamp: Utc::now(),
        actor_identifier: "0xbuyer".to_string(),
    }
}

/// Provider returning canned events per token and an optional snapshot.
#[derive(Default)]
pub struct FakeProvider {
    events: Mutex<HashMap<String, Vec<RawEvent>>>,
    snapshot: Mutex<Option<MarketSnapshot>>,
    event_calls: Mutex<Vec<String>>,
    snapshot_calls: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn set_events(&self, token_address: &str, events: Vec<RawEvent>) {
        self.events
            .lock()
            .unwrap()
            .insert(token_address.to_string(), events);
    }

    pub fn set_snapshot(&self, price_usd: f64, market_cap: f64) {
        *self.snapshot.lock().unwrap() = Some(MarketSnapshot {
            token_address: "0xabc".to_string(),
            token_symbol: CompactString::new("SLAY"),
            price_usd,
            market_cap,
            volume_24h: 0.0,
            price_change_24h: 0.0,
            liquidity_usd: 0.0,
            venue_id: "ekubo".to_string(),
            pair_address: "0xpair".to_string(),
            fetched_at: Utc::now(),
        });
    }

    pub fn clear_snapshot(&self) {
        *self.snapshot.lock().unwrap() = None;
    }

    pub fn event_calls(&self) -> Vec<String> {
        self.event_calls.lock().unwrap().clone()
    }

    pub fn snapshot_calls(&self) -> Vec<String> {
        self.snapshot_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenDataProvider for FakeProvider {
    async fn fetch_market_snapshot(
        &self,
        token_address: &str,
        _venue_hint: &str,
    ) -> Option<MarketSnapshot> {
        self.snapshot_calls
            .lock()
            .unwrap()
            .push(token_address.to_string());
        self.snapshot.lock().unwrap().clone()
    }

    async fn fetch_recent_events(&self, token_address: &str, _venue_hint: &str) -> Vec<RawEvent> {
        self.event_calls
            .lock()
            .unwrap()
            .push(token_address.to_string());
        self.events
            .lock()
            .unwrap()
            .get(token_address)
            .cloned()
            .unwrap_or_default()
    }
}

/// Registry and dedup set kept in memory.
#[derive(Default)]
pub struct MemoryStore {
    destinations: Mutex<Vec<DestinationConfig>>,
    notified: Mutex<HashSet<(DestinationId, String)>>,
    dedup_failing: AtomicBool,
    registry_failing: AtomicBool,
    failing_destinations: Mutex<HashSet<DestinationId>>,
    registry_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn add_destination(&self, config: DestinationConfig) {
        self.destinations.lock().unwrap().push(config);
    }

    pub fn clear_destinations(&self) {
        self.destinations.lock().unwrap().clear();
    }

    /// Make every dedup call fail.
    pub fn set_failing(&self, failing: bool) {
        self.dedup_failing.store(failing, Ordering::SeqCst);
    }

    /// Make dedup calls fail for one destination only.
    pub fn fail_destination(&self, destination_id: &str) {
        self.failing_destinations
            .lock()
            .unwrap()
            .insert(DestinationId::from(destination_id));
    }

    pub fn set_registry_failing(&self, failing: bool) {
        self.registry_failing.store(failing, Ordering::SeqCst);
    }

    pub fn registry_calls(&self) -> usize {
        self.registry_calls.load(Ordering::SeqCst)
    }

    pub fn notified_count(&self) -> usize {
        self.notified.lock().unwrap().len()
    }

    pub fn is_notified(&self, destination_id: &str, event_hash: &str) -> bool {
        self.notified
            .lock()
            .unwrap()
            .contains(&(DestinationId::from(destination_id), event_hash.to_string()))
    }

    fn check_dedup(&self, destination_id: &DestinationId) -> StoreResult<()> {
        if self.dedup_failing.load(Ordering::SeqCst)
            || self
                .failing_destinations
                .lock()
                .unwrap()
                .contains(destination_id)
        {
            return Err(StoreError::new("dedup store offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl DestinationRegistry for MemoryStore {
    async fn list_active_destinations(&self) -> StoreResult<Vec<DestinationConfig>> {
        self.registry_calls.fetch_add(1, Ordering::SeqCst);
        if self.registry_failing.load(Ordering::SeqCst) {
            return Err(StoreError::new("registry offline"));
        }
        Ok(self
            .destinations
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.is_active)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DedupStore for MemoryStore {
    async fn exists(&self, destination_id: &DestinationId, event_hash: &str) -> StoreResult<bool> {
        self.check_dedup(destination_id)?;
        Ok(self
            .notified
            .lock()
            .unwrap()
            .contains(&(destination_id.clone(), event_hash.to_string())))
    }

    async fn insert(&self, destination_id: &DestinationId, event_hash: &str) -> StoreResult<bool> {
        self.check_dedup(destination_id)?;
        Ok(self
            .notified
            .lock()
            .unwrap()
            .insert((destination_id.clone(), event_hash.to_string())))
    }
}

/// Sink recording every delivery, optionally failing or stalling.
#[derive(Default)]
pub struct RecordingSink {
    deliveries: Mutex<Vec<(DestinationId, AlertPayload)>>,
    failing: AtomicBool,
    stall: Mutex<Option<Duration>>,
}

impl RecordingSink {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_stall(&self, stall: Duration) {
        *self.stall.lock().unwrap() = Some(stall);
    }

    pub fn deliveries(&self) -> Vec<(DestinationId, AlertPayload)> {
        self.deliveries.lock().unwrap().clone()
    }

    pub fn delivered_hashes(&self) -> Vec<String> {
        self.deliveries
            .lock()
            .unwrap()
            .iter()
            .map(|(_, p)| p.event_hash.clone())
            .collect()
    }
}

#[async_trait]
impl AlertSink for RecordingSink {
    async fn notify(
        &self,
        destination_id: &DestinationId,
        payload: &AlertPayload,
    ) -> Result<(), DeliveryError> {
        let stall = *self.stall.lock().unwrap();
        if let Some(stall) = stall {
            tokio::time::sleep(stall).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeliveryError::Rejected("chat not found".to_string()));
        }
        self.deliveries
            .lock()
            .unwrap()
            .push((destination_id.clone(), payload.clone()));
        Ok(())
    }
}
