//! Upstream market data and event providers.
//!
//! This crate talks to third-party REST APIs and normalizes their responses
//! into the canonical types of `buyalert-core`.
//!
//! ## Architecture
//!
//! - `dexscreener` - Market snapshot client
//! - `source/` - Event sources (StarkScan, Voyager) and their parsers
//! - `provider` - Fallback adapter exposed to the engine as `TokenDataProvider`

pub mod dexscreener;
pub mod error;
pub mod parse;
pub mod provider;
pub mod rest;
pub mod source;
pub mod valuation;

pub use dexscreener::DexScreenerClient;
pub use error::*;
pub use provider::*;
pub use rest::{build_http_client, DEFAULT_REQUEST_TIMEOUT};
pub use source::{EventSource, StarkScanSource, VoyagerSource};
pub use valuation::Valuation;
