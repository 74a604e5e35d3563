//! Error types for upstream provider calls.

use thiserror::Error;

/// Errors that can occur while talking to an upstream provider.
///
/// These never leave the provider adapter: every variant is downgraded to
/// "no data" for the failing source.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Timeout(err.to_string())
        } else if err.is_decode() {
            FeedError::ParseError(err.to_string())
        } else if let Some(status) = err.status() {
            FeedError::from_status(status.as_u16())
        } else {
            FeedError::RequestFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::ParseError(err.to_string())
    }
}

impl FeedError {
    /// Map a non-success HTTP status to an error.
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => FeedError::RateLimitExceeded,
            other => FeedError::HttpStatus(other),
        }
    }

    /// Returns true if this error is transient and likely to succeed on a later sweep.
    pub fn is_transient(&self) -> bool {
        match self {
            FeedError::RequestFailed(_) | FeedError::Timeout(_) | FeedError::RateLimitExceeded => {
                true
            }
            FeedError::HttpStatus(status) => *status >= 500,
            FeedError::ParseError(_) => false,
        }
    }
}
