//! Application configuration.

use buyalert_engine::MonitorConfig;
use buyalert_feeds::{ProviderConfig, Valuation, DEFAULT_MAX_EVENTS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Dispatch loop timing.
    pub monitor: MonitorSettings,
    /// Upstream APIs.
    pub providers: ProviderSettings,
    /// Cleanup of old dedup entries.
    pub retention: RetentionSettings,
    /// Logging level, overridden by `--log-level`.
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retention.days < 1 {
            return Err(ConfigError::Invalid {
                field: "retention.days",
                reason: format!("must be at least 1, got {}", self.retention.days),
            });
        }
        Ok(())
    }
}

/// Monitor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub sweep_interval_secs: u64,
    pub error_backoff_secs: u64,
    pub idle_interval_secs: u64,
    pub delivery_timeout_secs: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 15,
            error_backoff_secs: 30,
            idle_interval_secs: 60,
            delivery_timeout_secs: 10,
        }
    }
}

impl From<&MonitorSettings> for MonitorConfig {
    fn from(settings: &MonitorSettings) -> Self {
        MonitorConfig {
            sweep_interval: Duration::from_secs(settings.sweep_interval_secs),
            error_backoff: Duration::from_secs(settings.error_backoff_secs),
            idle_interval: Duration::from_secs(settings.idle_interval_secs),
            delivery_timeout: Duration::from_secs(settings.delivery_timeout_secs),
        }
    }
}

/// Shown in alerts while no holder indexer is wired in.
pub const DEFAULT_HOLDER_COUNT: u64 = 143;

/// Provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub dexscreener_url: String,
    pub starkscan_url: String,
    pub voyager_url: String,
    pub request_timeout_secs: u64,
    pub max_events: usize,
    pub valuation: Valuation,
    /// Holder count shown in alerts until an indexer is available.
    pub holder_count: Option<u64>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        let defaults = ProviderConfig::default();
        Self {
            dexscreener_url: defaults.dexscreener_url,
            starkscan_url: defaults.starkscan_url,
            voyager_url: defaults.voyager_url,
            request_timeout_secs: defaults.request_timeout.as_secs(),
            max_events: DEFAULT_MAX_EVENTS,
            valuation: defaults.valuation,
            holder_count: Some(DEFAULT_HOLDER_COUNT),
        }
    }
}

impl From<&ProviderSettings> for ProviderConfig {
    fn from(settings: &ProviderSettings) -> Self {
        ProviderConfig {
            dexscreener_url: settings.dexscreener_url.clone(),
            starkscan_url: settings.starkscan_url.clone(),
            voyager_url: settings.voyager_url.clone(),
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
            max_events: settings.max_events,
            valuation: settings.valuation.clone(),
        }
    }
}

/// Retention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionSettings {
    /// Notified events older than this are purged.
    pub days: i64,
    pub interval_secs: u64,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            days: 7,
            interval_secs: 3600,
        }
    }
}
