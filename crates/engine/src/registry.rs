//! Read path into the destination registry.

use crate::error::StoreResult;
use async_trait::async_trait;
use buyalert_core::DestinationConfig;

/// Source of the destinations the dispatch loop should visit.
#[async_trait]
pub trait DestinationRegistry: Send + Sync {
    /// All destinations with `is_active = true`, in a stable order.
    async fn list_active_destinations(&self) -> StoreResult<Vec<DestinationConfig>>;
}
