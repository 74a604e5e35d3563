//! Buy alert dispatch engine.
//!
//! This crate contains the monitoring loop that turns on-chain buy events into
//! per-destination alerts, together with the seams it depends on: the
//! destination registry, the dedup store and the delivery sink.

pub mod dedup;
pub mod delivery;
pub mod error;
pub mod metrics;
pub mod monitor;
pub mod registry;

#[cfg(test)]
mod testing;

pub use dedup::*;
pub use delivery::*;
pub use error::*;
pub use metrics::*;
pub use monitor::*;
pub use registry::*;
