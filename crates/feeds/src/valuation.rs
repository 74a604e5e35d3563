//! Conversion constants used to value raw transfer amounts.
//!
//! Event sources report token amounts only. Until a real price source is
//! wired in, the USD value of a transfer is estimated from these settings.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Settings for turning raw transfer amounts into quote-currency values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Valuation {
    /// Decimals of raw on-chain amounts.
    pub token_decimals: u32,
    /// Asset buyers pay in.
    pub settlement_symbol: CompactString,
    /// USD price of the settlement asset.
    pub settlement_usd_price: f64,
    /// USD value per token unit for sources that report already-scaled amounts.
    pub fallback_unit_usd: f64,
}

impl Default for Valuation {
    fn default() -> Self {
        Self {
            token_decimals: 18,
            settlement_symbol: CompactString::new("ETH"),
            settlement_usd_price: 3700.0,
            fallback_unit_usd: 0.001,
        }
    }
}

impl Valuation {
    /// Scale a raw on-chain amount by `token_decimals`.
    pub fn scale_raw(&self, raw: f64) -> f64 {
        raw / 10f64.powi(self.token_decimals as i32)
    }

    /// USD value of an amount of the settlement asset.
    pub fn settlement_to_usd(&self, amount: f64) -> f64 {
        amount * self.settlement_usd_price
    }

    /// Settlement-asset amount equivalent to a USD value.
    pub fn usd_to_settlement(&self, usd: f64) -> f64 {
        if self.settlement_usd_price > 0.0 {
            usd / self.settlement_usd_price
        } else {
            0.0
        }
    }
}
