//! `OrderBook`: the public face of the cache
//!
//! Wires the resolver, the quote store and the poll scheduler together.
//! Mutations (`add`, `delete`) and reads go straight to the store; only the
//! scheduler's background task ever talks to the exchanges.

use crate::{
    adapter::AdapterSet,
    config::OrderBookConfig,
    error::OrderBookError,
    mapping::MappingProvider,
    metrics::FetchMetrics,
    providers::CryptoCompareProvider,
    resolver::TickerResolver,
    scheduler::{PollContext, PollScheduler},
    store::QuoteStore,
    types::{
        normalize_pair, ComponentHealth, Exchange, HealthStatus, PairKey, Quote, WatchedPair,
    },
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Top-of-book cache for a set of exchanges
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use topbid::OrderBook;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let book = OrderBook::new("cryptocompare-api-key", ["binance", "kucoin"]).await?;
/// book.add("binance", "BTC/USDT").await?;
/// book.start(Duration::from_secs(1))?;
///
/// tokio::time::sleep(Duration::from_secs(2)).await;
/// let (price, volume) = book.get_orderbook_top_bid("binance", "BTC/USDT")?;
/// println!("best bid {} x {}", price, volume);
///
/// book.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct OrderBook {
    resolver: TickerResolver,
    store: Arc<QuoteStore>,
    poll: Arc<PollContext>,
    scheduler: PollScheduler,
    config: OrderBookConfig,
}

impl OrderBook {
    /// Creates an order book backed by CryptoCompare mappings and the
    /// exchanges' public REST APIs
    ///
    /// Configuration is read with `OrderBookConfig::from_env()`. The pair
    /// mapping of every exchange is loaded before this returns.
    pub async fn new<I, S>(api_key: &str, exchanges: I) -> Result<Self, OrderBookError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_config(api_key, exchanges, OrderBookConfig::from_env()).await
    }

    /// Like `new`, with explicit configuration
    pub async fn with_config<I, S>(
        api_key: &str,
        exchanges: I,
        config: OrderBookConfig,
    ) -> Result<Self, OrderBookError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(OrderBookError::configuration("API key must not be empty"));
        }

        let mut parsed = Vec::new();
        for name in exchanges {
            let exchange: Exchange = name.as_ref().parse()?;
            if !parsed.contains(&exchange) {
                parsed.push(exchange);
            }
        }

        let provider = CryptoCompareProvider::new(
            api_key,
            config.mapping_api_url.clone(),
            config.mapping_timeout,
        )
        .map_err(|e| OrderBookError::configuration(format!("mapping client: {}", e)))?;
        let adapters = AdapterSet::for_exchanges(&parsed, &config)
            .map_err(|e| OrderBookError::configuration(format!("exchange client: {}", e)))?;

        Self::with_components(Arc::new(provider), adapters, config).await
    }

    /// Creates an order book from explicit collaborators
    ///
    /// The configured exchanges are exactly those in `adapters`. A rejected
    /// API key fails construction; any other mapping failure is logged and
    /// the load is retried by the next `add` for that exchange.
    pub async fn with_components(
        mapping_provider: Arc<dyn MappingProvider>,
        adapters: AdapterSet,
        config: OrderBookConfig,
    ) -> Result<Self, OrderBookError> {
        let exchanges = adapters.exchanges();
        if exchanges.is_empty() {
            return Err(OrderBookError::configuration(
                "at least one exchange is required",
            ));
        }

        let resolver = TickerResolver::new(mapping_provider);
        for exchange in &exchanges {
            match resolver.preload(*exchange).await {
                Ok(()) => {}
                Err(e @ OrderBookError::Configuration(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!(%exchange, error = %e, "Pair mapping not loaded, will retry on add");
                }
            }
        }

        let store = Arc::new(QuoteStore::new());
        let poll = Arc::new(PollContext::new(store.clone(), adapters, &config));
        let scheduler = PollScheduler::new(poll.clone(), &config);

        Ok(Self {
            resolver,
            store,
            poll,
            scheduler,
            config,
        })
    }

    /// Exchanges this order book was created for
    pub fn exchanges(&self) -> Vec<Exchange> {
        self.poll.adapters.exchanges()
    }

    fn configured_exchange(&self, name: &str) -> Result<Exchange, OrderBookError> {
        let exchange: Exchange = name.parse()?;
        if !self.poll.adapters.contains(exchange) {
            return Err(OrderBookError::configuration(format!(
                "exchange {} was not configured for this order book",
                exchange
            )));
        }
        Ok(exchange)
    }

    /// Reads and deletes accept any supported exchange; a pair on one this
    /// book was not built with is simply never watched.
    fn key(&self, exchange: &str, pair: &str) -> Result<PairKey, OrderBookError> {
        let exchange: Exchange = exchange.parse()?;
        let pair =
            normalize_pair(pair).ok_or_else(|| OrderBookError::pair_not_watched(exchange, pair))?;
        Ok(PairKey::new(exchange, pair))
    }

    /// Starts watching `pair` on `exchange`
    ///
    /// Returns once the pair is registered; its first quote arrives with the
    /// next poll cycle. Adding a watched pair again is a no-op.
    pub async fn add(&self, exchange: &str, pair: &str) -> Result<(), OrderBookError> {
        self.add_pairs(exchange, [pair]).await
    }

    /// Starts watching several pairs on one exchange
    ///
    /// Every pair is resolved before any is registered, so on error none of
    /// them is added. Fails with `SchedulerStopped` once the book is stopped.
    pub async fn add_pairs<I, S>(&self, exchange: &str, pairs: I) -> Result<(), OrderBookError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.scheduler.is_stopped() {
            return Err(OrderBookError::SchedulerStopped);
        }
        let exchange = self.configured_exchange(exchange)?;

        let mut resolved = Vec::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let normalized = normalize_pair(pair)
                .ok_or_else(|| OrderBookError::pair_unavailable(exchange, pair))?;
            let native_symbol = self.resolver.resolve(exchange, &normalized).await?;
            resolved.push(WatchedPair::new(exchange, normalized, native_symbol));
        }

        for pair in resolved {
            // A concurrent stop closes the store and clears anything watched
            // before it, so a late add cannot leave a dead entry behind.
            if self.store.watch(&pair)? {
                tracing::debug!(
                    %exchange,
                    pair = pair.pair(),
                    symbol = %pair.native_symbol,
                    "Watching pair"
                );
            }
        }
        Ok(())
    }

    /// Stops watching `pair` and drops its quote; no-op if it isn't watched
    pub fn delete(&self, exchange: &str, pair: &str) -> Result<(), OrderBookError> {
        let exchange: Exchange = exchange.parse()?;
        if let Some(pair) = normalize_pair(pair) {
            if self.store.unwatch(&PairKey::new(exchange, pair.as_str())) {
                tracing::debug!(%exchange, pair = %pair, "Stopped watching pair");
            }
        }
        Ok(())
    }

    /// Starts polling every `update_every`
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, update_every: Duration) -> Result<(), OrderBookError> {
        self.scheduler.start(update_every)
    }

    /// Stops polling and clears all watched pairs and quotes
    ///
    /// Idempotent. After `stop`, `start` fails with `SchedulerStopped`.
    pub async fn stop(&self) {
        self.scheduler.stop().await
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Best bid on `exchange` for `pair` as `(price, volume)`
    pub fn get_orderbook_top_bid(
        &self,
        exchange: &str,
        pair: &str,
    ) -> Result<(f64, f64), OrderBookError> {
        self.store.top_bid(&self.key(exchange, pair)?)
    }

    /// Best ask on `exchange` for `pair` as `(price, volume)`
    pub fn get_orderbook_top_ask(
        &self,
        exchange: &str,
        pair: &str,
    ) -> Result<(f64, f64), OrderBookError> {
        self.store.top_ask(&self.key(exchange, pair)?)
    }

    /// Full cached quote, including when it was last refreshed
    pub fn get_quote(&self, exchange: &str, pair: &str) -> Result<Quote, OrderBookError> {
        self.store.get(&self.key(exchange, pair)?)
    }

    /// Snapshot of the watched pairs
    pub fn watched_pairs(&self) -> Vec<WatchedPair> {
        self.store.watched()
    }

    /// Symbol `exchange`'s REST API uses for `pair`
    pub async fn exchange_symbol(&self, exchange: &str, pair: &str) -> Result<String, OrderBookError> {
        let exchange = self.configured_exchange(exchange)?;
        self.resolver.resolve(exchange, pair).await
    }

    /// Markdown link to the exchange's trading chart, e.g.
    /// `[VAIOT/USDT](https://www.kucoin.com/trade/VAI-USDT)`
    pub async fn chart_url(&self, exchange: &str, pair: &str) -> Result<String, OrderBookError> {
        let exchange = self.configured_exchange(exchange)?;
        let symbol = self.resolver.market_symbol(exchange, pair).await?;
        let normalized = normalize_pair(pair).unwrap_or_else(|| pair.to_string());
        Ok(exchange.chart_url(&normalized, &symbol))
    }

    /// Fetch latency and success rate for one exchange
    pub async fn fetch_metrics(&self, exchange: Exchange) -> Option<FetchMetrics> {
        match self.poll.metrics.collector(exchange) {
            Some(collector) => Some(collector.get_metrics().await),
            None => None,
        }
    }

    /// Summarizes how fresh the cached quotes are
    pub fn health_check(&self) -> ComponentHealth {
        let entries = self.store.entries();
        let threshold = self.config.stale_threshold_secs;

        let mut missing = Vec::new();
        let mut stale = Vec::new();
        let mut fresh = 0usize;
        for (pair, quote) in &entries {
            match quote {
                None => missing.push(pair.key.to_string()),
                Some(q) if q.is_stale(threshold) => stale.push(pair.key.to_string()),
                Some(_) => fresh += 1,
            }
        }
        missing.sort();
        stale.sort();

        let mut details = HashMap::new();
        details.insert("running".to_string(), serde_json::json!(self.is_running()));
        details.insert("watched_pairs".to_string(), serde_json::json!(entries.len()));
        details.insert("fresh_quotes".to_string(), serde_json::json!(fresh));
        details.insert("missing_quotes".to_string(), serde_json::json!(missing));
        details.insert("stale_quotes".to_string(), serde_json::json!(stale));

        let status = if entries.is_empty() || fresh == entries.len() {
            HealthStatus::Healthy
        } else if fresh == 0 {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Degraded
        };

        let message = match status {
            HealthStatus::Healthy => "All watched pairs have fresh quotes".to_string(),
            HealthStatus::Degraded => format!(
                "{} missing and {} stale quotes",
                missing.len(),
                stale.len()
            ),
            HealthStatus::Unhealthy => "No fresh quotes for any watched pair".to_string(),
        };

        ComponentHealth {
            name: "topbid_orderbook".to_string(),
            status,
            message: Some(message),
            details,
            last_checked: chrono::Utc::now(),
        }
    }
}
