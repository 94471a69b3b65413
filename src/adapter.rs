//! Exchange adapter abstraction for fetching top of book

use crate::{
    adapters::{
        BinanceAdapter, BybitAdapter, GateioAdapter, KrakenAdapter, KucoinAdapter, OkxAdapter,
    },
    config::OrderBookConfig,
    error::FetchError,
    types::{Exchange, TopOfBook},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Trait for exchange REST adapters
///
/// One implementation per supported exchange. Implementations should not
/// retry; the poll loop simply tries again next cycle.
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    /// Fetches the current best bid and best ask for a native symbol
    async fn fetch_top_of_book(&self, native_symbol: &str) -> Result<TopOfBook, FetchError>;

    /// The exchange this adapter talks to
    fn exchange(&self) -> Exchange;
}

/// Builds the REST adapter for `exchange`
pub fn build_adapter(
    exchange: Exchange,
    config: &OrderBookConfig,
) -> Result<Arc<dyn ExchangeAdapter>, FetchError> {
    let base_url = config.exchange_api_url(exchange);
    let timeout = config.fetch_timeout;
    let adapter: Arc<dyn ExchangeAdapter> = match exchange {
        Exchange::Binance => Arc::new(BinanceAdapter::new(base_url, timeout)?),
        Exchange::Bybit => Arc::new(BybitAdapter::new(base_url, timeout)?),
        Exchange::Gateio => Arc::new(GateioAdapter::new(base_url, timeout)?),
        Exchange::Kraken => Arc::new(KrakenAdapter::new(base_url, timeout)?),
        Exchange::Kucoin => Arc::new(KucoinAdapter::new(base_url, timeout)?),
        Exchange::Okx => Arc::new(OkxAdapter::new(base_url, timeout)?),
    };
    Ok(adapter)
}

/// The adapters configured for one `OrderBook`, keyed by exchange
#[derive(Clone, Default)]
pub struct AdapterSet {
    adapters: HashMap<Exchange, Arc<dyn ExchangeAdapter>>,
}

impl AdapterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds REST adapters for each exchange
    pub fn for_exchanges(
        exchanges: &[Exchange],
        config: &OrderBookConfig,
    ) -> Result<Self, FetchError> {
        let mut set = Self::new();
        for exchange in exchanges {
            set.insert(build_adapter(*exchange, config)?);
        }
        Ok(set)
    }

    /// Registers an adapter under the exchange it reports
    pub fn insert(&mut self, adapter: Arc<dyn ExchangeAdapter>) {
        self.adapters.insert(adapter.exchange(), adapter);
    }

    pub fn with(mut self, adapter: Arc<dyn ExchangeAdapter>) -> Self {
        self.insert(adapter);
        self
    }

    pub fn get(&self, exchange: Exchange) -> Option<&Arc<dyn ExchangeAdapter>> {
        self.adapters.get(&exchange)
    }

    pub fn contains(&self, exchange: Exchange) -> bool {
        self.adapters.contains_key(&exchange)
    }

    pub fn exchanges(&self) -> Vec<Exchange> {
        let mut exchanges: Vec<_> = self.adapters.keys().copied().collect();
        exchanges.sort();
        exchanges
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Clone, Copy)]
    enum Response {
        Book(TopOfBook),
        Fail,
        Hang,
    }

    /// Mock adapter for testing
    pub struct MockAdapter {
        exchange: Exchange,
        responses: Mutex<HashMap<String, Response>>,
        delay: Mutex<Duration>,
        call_count: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockAdapter {
        pub fn new(exchange: Exchange) -> Self {
            Self {
                exchange,
                responses: Mutex::new(HashMap::new()),
                delay: Mutex::new(Duration::ZERO),
                call_count: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        pub fn set_book(&self, symbol: &str, book: TopOfBook) {
            self.responses
                .lock()
                .unwrap()
                .insert(symbol.to_string(), Response::Book(book));
        }

        pub fn set_error(&self, symbol: &str) {
            self.responses
                .lock()
                .unwrap()
                .insert(symbol.to_string(), Response::Fail);
        }

        /// Never answers for `symbol`
        pub fn set_hang(&self, symbol: &str) {
            self.responses
                .lock()
                .unwrap()
                .insert(symbol.to_string(), Response::Hang);
        }

        pub fn set_delay(&self, delay: Duration) {
            *self.delay.lock().unwrap() = delay;
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        pub fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ExchangeAdapter for MockAdapter {
        async fn fetch_top_of_book(&self, native_symbol: &str) -> Result<TopOfBook, FetchError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let delay = *self.delay.lock().unwrap();
            let response = self.responses.lock().unwrap().get(native_symbol).copied();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if let Some(Response::Hang) = response {
                std::future::pending::<()>().await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            match response {
                Some(Response::Book(book)) => Ok(book),
                Some(Response::Fail) => Err(FetchError::Api("mock failure".to_string())),
                _ => Err(FetchError::InvalidResponse(format!(
                    "unknown symbol {}",
                    native_symbol
                ))),
            }
        }

        fn exchange(&self) -> Exchange {
            self.exchange
        }
    }
}
