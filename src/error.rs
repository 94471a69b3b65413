//! Error types for the top-of-book cache

use crate::types::Exchange;
use thiserror::Error;

/// Errors that can occur when fetching top of book from an exchange
///
/// These never reach the caller: the poll loop logs them and keeps the
/// previous quote.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network request failed
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Invalid or unexpected response body
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Exchange API error (non-2xx or error code in body)
    #[error("Exchange API error: {0}")]
    Api(String),

    /// Timeout waiting for response
    #[error("Request timeout")]
    Timeout,
}

/// Errors returned by a pair-mapping provider
#[derive(Debug, Error)]
pub enum MappingError {
    /// Network request failed
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API key was rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Provider has no mappings for this exchange
    #[error("Exchange not supported by mapping provider: {0}")]
    UnsupportedExchange(String),

    /// Invalid response from provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Provider API error
    #[error("Provider API error: {0}")]
    Api(String),
}

/// Errors surfaced by the `OrderBook` facade
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OrderBookError {
    /// Bad API key, unknown or unconfigured exchange, bad interval
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The exchange's pair mapping could not be loaded
    #[error("Pair mapping unavailable for {exchange}: {reason}")]
    MappingUnavailable { exchange: Exchange, reason: String },

    /// The pair is not listed in the exchange's mapping
    #[error("Pair {pair} is not available on {exchange}")]
    PairUnavailable { exchange: Exchange, pair: String },

    /// Pair is watched but no fetch has succeeded yet
    #[error("Quote not available yet for {pair} on {exchange}")]
    NotAvailable { exchange: Exchange, pair: String },

    /// Pair was never added, or has been deleted
    #[error("Pair {pair} is not watched on {exchange}")]
    PairNotWatched { exchange: Exchange, pair: String },

    /// `start` was called while the scheduler is running
    #[error("Scheduler is already running")]
    AlreadyRunning,

    /// `start` was called after `stop`
    #[error("Scheduler has been stopped")]
    SchedulerStopped,
}

impl OrderBookError {
    /// Creates a Configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a MappingUnavailable error
    pub fn mapping_unavailable(exchange: Exchange, reason: impl ToString) -> Self {
        Self::MappingUnavailable {
            exchange,
            reason: reason.to_string(),
        }
    }

    /// Creates a PairUnavailable error
    pub fn pair_unavailable(exchange: Exchange, pair: &str) -> Self {
        Self::PairUnavailable {
            exchange,
            pair: pair.to_string(),
        }
    }

    /// Creates a NotAvailable error
    pub fn not_available(exchange: Exchange, pair: &str) -> Self {
        Self::NotAvailable {
            exchange,
            pair: pair.to_string(),
        }
    }

    /// Creates a PairNotWatched error
    pub fn pair_not_watched(exchange: Exchange, pair: &str) -> Self {
        Self::PairNotWatched {
            exchange,
            pair: pair.to_string(),
        }
    }

    /// Maps a provider failure for `exchange` to the caller-visible error.
    ///
    /// A rejected API key is a configuration problem; anything else means the
    /// mapping is (for now) unavailable.
    pub fn from_mapping(exchange: Exchange, err: MappingError) -> Self {
        match err {
            MappingError::Unauthorized(msg) => {
                Self::Configuration(format!("mapping provider rejected API key: {}", msg))
            }
            other => Self::mapping_unavailable(exchange, other),
        }
    }
}
