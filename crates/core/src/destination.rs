//! Alert destinations and their monitoring configuration.

use crate::normalize_token_address;
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum length of a token display symbol.
pub const MAX_SYMBOL_LEN: usize = 10;

/// Errors raised when a destination configuration violates its invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Token address must not be empty")]
    EmptyAddress,

    #[error("Token symbol must be 1-{MAX_SYMBOL_LEN} characters, got {0}")]
    InvalidSymbol(usize),

    #[error("Total supply must be greater than 0")]
    ZeroSupply,

    #[error("Minimum buy threshold must be 0 or higher, got {0}")]
    NegativeThreshold(f64),

    #[error("Unknown alert frequency: {0}")]
    UnknownFrequency(String),
}

/// Opaque identifier of an alert destination (a chat id for Telegram).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationId(String);

impl DestinationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DestinationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for DestinationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<i64> for DestinationId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// How often a destination wants to be alerted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertFrequency {
    /// One alert per qualifying buy.
    #[default]
    EveryBuy,
}

impl AlertFrequency {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertFrequency::EveryBuy => "every_buy",
        }
    }

    /// Human readable label ("Every Buy").
    pub fn label(self) -> &'static str {
        match self {
            AlertFrequency::EveryBuy => "Every Buy",
        }
    }
}

impl FromStr for AlertFrequency {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "every_buy" => Ok(AlertFrequency::EveryBuy),
            other => Err(ConfigError::UnknownFrequency(other.to_string())),
        }
    }
}

/// Monitoring configuration of one destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Unique destination key.
    pub destination_id: DestinationId,
    /// Watched token address as entered by the operator (may carry a suffix).
    pub token_address: String,
    /// Display symbol, 1-10 characters.
    pub token_symbol: CompactString,
    /// Trading venue display name (e.g. "Ekubo").
    pub venue_name: String,
    /// Total token supply, always positive.
    pub total_supply: u64,
    /// Minimum buy size in quote currency (USD). Inclusive.
    pub min_buy_threshold: f64,
    pub alert_frequency: AlertFrequency,
    /// Whether the dispatch loop visits this destination.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DestinationConfig {
    /// Create an active configuration with `every_buy` alerts.
    pub fn new(
        destination_id: impl Into<DestinationId>,
        token_address: impl Into<String>,
        token_symbol: &str,
        venue_name: impl Into<String>,
        total_supply: u64,
        min_buy_threshold: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            destination_id: destination_id.into(),
            token_address: token_address.into(),
            token_symbol: CompactString::new(token_symbol),
            venue_name: venue_name.into(),
            total_supply,
            min_buy_threshold,
            alert_frequency: AlertFrequency::EveryBuy,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check the configuration invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_address.trim().is_empty() || self.canonical_address().is_empty() {
            return Err(ConfigError::EmptyAddress);
        }
        let symbol_len = self.token_symbol.chars().count();
        if symbol_len == 0 || symbol_len > MAX_SYMBOL_LEN {
            return Err(ConfigError::InvalidSymbol(symbol_len));
        }
        if self.total_supply == 0 {
            return Err(ConfigError::ZeroSupply);
        }
        // NaN fails this comparison too
        if !(self.min_buy_threshold >= 0.0) {
            return Err(ConfigError::NegativeThreshold(self.min_buy_threshold));
        }
        Ok(())
    }

    /// Token address with any suffix stripped.
    #[inline]
    pub fn canonical_address(&self) -> &str {
        normalize_token_address(&self.token_address)
    }

    /// Whether a buy worth `amount_quote` meets the threshold.
    #[inline]
    pub fn meets_threshold(&self, amount_quote: f64) -> bool {
        amount_quote >= self.min_buy_threshold
    }
}
