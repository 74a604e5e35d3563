//! Delivery callback interface.

use crate::error::DeliveryError;
use async_trait::async_trait;
use buyalert_core::{AlertPayload, DestinationId};

/// Receives computed alerts. A returned error leaves the event unrecorded.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn notify(
        &self,
        destination_id: &DestinationId,
        payload: &AlertPayload,
    ) -> Result<(), DeliveryError>;
}
