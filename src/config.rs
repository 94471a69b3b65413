//! Runtime configuration for an `OrderBook`
//!
//! Defaults come from `constants`. `from_env()` lets a deployment tune the
//! poll loop without recompiling.

use std::collections::HashMap;
use std::time::Duration;

use crate::constants::{
    BINANCE_API_URL, BYBIT_API_URL, CRYPTOCOMPARE_API_URL, FETCH_TIMEOUT_MS, GATEIO_API_URL,
    KRAKEN_API_URL, KUCOIN_API_URL, MAPPING_TIMEOUT_SECS, MAX_CONCURRENT_FETCHES, OKX_API_URL,
    SHUTDOWN_GRACE_MS, STALE_THRESHOLD_SECS,
};
use crate::types::Exchange;

#[derive(Debug, Clone)]
pub struct OrderBookConfig {
    /// Timeout applied to each exchange request inside a poll cycle
    pub fetch_timeout: Duration,
    /// Max exchange requests in flight within one cycle
    pub max_concurrent_fetches: usize,
    /// HTTP timeout for the mapping provider
    pub mapping_timeout: Duration,
    /// Base URL of the CryptoCompare API
    pub mapping_api_url: String,
    /// Age after which `health_check` reports a quote as stale
    pub stale_threshold_secs: u64,
    /// How long `stop()` waits past `fetch_timeout` before aborting the worker
    pub shutdown_grace: Duration,
    /// Per-exchange REST base URL overrides
    pub exchange_api_urls: HashMap<Exchange, String>,
}

impl Default for OrderBookConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_millis(FETCH_TIMEOUT_MS),
            max_concurrent_fetches: MAX_CONCURRENT_FETCHES,
            mapping_timeout: Duration::from_secs(MAPPING_TIMEOUT_SECS),
            mapping_api_url: CRYPTOCOMPARE_API_URL.to_string(),
            stale_threshold_secs: STALE_THRESHOLD_SECS,
            shutdown_grace: Duration::from_millis(SHUTDOWN_GRACE_MS),
            exchange_api_urls: HashMap::new(),
        }
    }
}

impl OrderBookConfig {
    /// Defaults, overridden by any `TOPBID_*` environment variables that parse
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ms) = env_parse::<u64>("TOPBID_FETCH_TIMEOUT_MS") {
            config.fetch_timeout = Duration::from_millis(ms);
        }
        if let Some(n) = env_parse::<usize>("TOPBID_MAX_CONCURRENT_FETCHES") {
            config.max_concurrent_fetches = n;
        }
        if let Some(secs) = env_parse::<u64>("TOPBID_STALE_THRESHOLD_SECS") {
            config.stale_threshold_secs = secs;
        }
        if let Ok(url) = std::env::var("TOPBID_MAPPING_API_URL") {
            config.mapping_api_url = url;
        }

        config
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_max_concurrent_fetches(mut self, n: usize) -> Self {
        self.max_concurrent_fetches = n;
        self
    }

    pub fn with_mapping_api_url(mut self, url: impl Into<String>) -> Self {
        self.mapping_api_url = url.into();
        self
    }

    pub fn with_stale_threshold_secs(mut self, secs: u64) -> Self {
        self.stale_threshold_secs = secs;
        self
    }

    pub fn with_exchange_api_url(mut self, exchange: Exchange, url: impl Into<String>) -> Self {
        self.exchange_api_urls.insert(exchange, url.into());
        self
    }

    /// REST base URL for `exchange`, honoring overrides
    pub fn exchange_api_url(&self, exchange: Exchange) -> &str {
        if let Some(url) = self.exchange_api_urls.get(&exchange) {
            return url;
        }
        match exchange {
            Exchange::Binance => BINANCE_API_URL,
            Exchange::Bybit => BYBIT_API_URL,
            Exchange::Gateio => GATEIO_API_URL,
            Exchange::Kraken => KRAKEN_API_URL,
            Exchange::Kucoin => KUCOIN_API_URL,
            Exchange::Okx => OKX_API_URL,
        }
    }

    /// Concurrency limit actually used by the poll loop (never zero)
    pub(crate) fn fetch_concurrency(&self) -> usize {
        self.max_concurrent_fetches.max(1)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparsable environment override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrderBookConfig::default();
        assert_eq!(config.fetch_timeout, Duration::from_millis(FETCH_TIMEOUT_MS));
        assert_eq!(config.exchange_api_url(Exchange::Kucoin), KUCOIN_API_URL);
        assert_eq!(config.fetch_concurrency(), MAX_CONCURRENT_FETCHES);
    }

    #[test]
    fn test_overrides() {
        let config = OrderBookConfig::default()
            .with_exchange_api_url(Exchange::Binance, "http://127.0.0.1:9999")
            .with_max_concurrent_fetches(0);
        assert_eq!(
            config.exchange_api_url(Exchange::Binance),
            "http://127.0.0.1:9999"
        );
        assert_eq!(config.exchange_api_url(Exchange::Okx), OKX_API_URL);
        assert_eq!(config.fetch_concurrency(), 1);
    }
}
