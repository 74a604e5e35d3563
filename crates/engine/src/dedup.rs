//! Deduplication gate over the set of already-notified events.

use crate::error::StoreResult;
use async_trait::async_trait;
use buyalert_core::DestinationId;
use std::sync::Arc;
use tracing::debug;

/// Persistent set of `(destination_id, event_hash)` keys.
#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Whether the key was already recorded.
    async fn exists(&self, destination_id: &DestinationId, event_hash: &str) -> StoreResult<bool>;

    /// Insert the key if absent. Returns `true` if a new entry was written.
    /// Repeated or concurrent calls with the same key must succeed.
    async fn insert(&self, destination_id: &DestinationId, event_hash: &str) -> StoreResult<bool>;
}

/// Outcome of [`DedupGate::record_alerted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    AlreadyRecorded,
}

/// Decides whether an event still needs an alert for a destination.
#[derive(Clone)]
pub struct DedupGate {
    store: Arc<dyn DedupStore>,
}

impl DedupGate {
    pub fn new(store: Arc<dyn DedupStore>) -> Self {
        Self { store }
    }

    /// False if this event already produced an alert for the destination.
    pub async fn should_alert(
        &self,
        destination_id: &DestinationId,
        event_hash: &str,
    ) -> StoreResult<bool> {
        Ok(!self.store.exists(destination_id, event_hash).await?)
    }

    /// Mark the event as alerted. Call only after a successful delivery.
    pub async fn record_alerted(
        &self,
        destination_id: &DestinationId,
        event_hash: &str,
    ) -> StoreResult<RecordOutcome> {
        if self.store.insert(destination_id, event_hash).await? {
            Ok(RecordOutcome::Recorded)
        } else {
            debug!(destination = %destination_id, tx_hash = event_hash, "Event already recorded");
            Ok(RecordOutcome::AlreadyRecorded)
        }
    }
}
