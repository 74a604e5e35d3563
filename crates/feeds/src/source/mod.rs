//! Upstream sources of recent token transfer events.
//!
//! - `starkscan` - StarkScan contract events
//! - `voyager` - Voyager transfer listings

mod starkscan;
mod voyager;

pub use starkscan::StarkScanSource;
pub use voyager::VoyagerSource;

use crate::error::FeedError;
use async_trait::async_trait;
use buyalert_core::RawEvent;

/// One upstream source of recent events for a token.
///
/// Implementations skip records they cannot parse; an `Err` means the whole
/// source produced no usable data this time.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Fetch at most `limit` parsed events, most recent first when upstream orders them so.
    async fn fetch_events(
        &self,
        token_address: &str,
        limit: usize,
    ) -> Result<Vec<RawEvent>, FeedError>;
}
