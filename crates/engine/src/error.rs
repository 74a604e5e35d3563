//! Error types for the dispatch pipeline.

use thiserror::Error;

/// Failure of the persistent store behind the registry or dedup set.
#[derive(Debug, Clone, Error)]
#[error("Store unavailable: {0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Failure to hand an alert to its destination.
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    #[error("Delivery rejected: {0}")]
    Rejected(String),

    #[error("Delivery timed out")]
    Timeout,
}

/// Errors that abort a whole sweep.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Failed to load active destinations: {0}")]
    Registry(#[source] StoreError),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
