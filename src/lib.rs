//! # topbid
//!
//! A background-polled cache of the best bid and best ask for trading pairs
//! on cryptocurrency exchanges.
//!
//! Consumers register the pairs they care about and then read the current
//! top of book synchronously, without running their own polling loop. Each
//! `OrderBook` owns one tokio task that polls the exchanges' public REST
//! APIs on a fixed interval.
//!
//! ## Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use topbid::{OrderBook, OrderBookError};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let book = OrderBook::new("cryptocompare-api-key", ["binance", "kraken"]).await?;
//! book.add_pairs("binance", ["BTC/USDT", "ETH/USDT"]).await?;
//! book.start(Duration::from_secs(1))?;
//!
//! match book.get_orderbook_top_bid("binance", "BTC/USDT") {
//!     Ok((price, volume)) => println!("BTC/USDT bid {} x {}", price, volume),
//!     Err(OrderBookError::NotAvailable { .. }) => println!("no quote yet"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//!
//! book.stop().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! OrderBook::add ──> TickerResolver ──> MappingProvider (CryptoCompare, once per exchange)
//!      │
//!      ▼
//! QuoteStore  <── PollScheduler task (every update_every)
//!      │                │
//!      │                ▼
//!      │          ExchangeAdapter (binance, bybit, gateio, kraken, kucoin, okx)
//!      ▼
//! get_orderbook_top_bid / get_orderbook_top_ask
//! ```
//!
//! ## Failure semantics
//!
//! A failed or timed-out fetch is logged and leaves the previous quote in
//! place; callers can detect staleness through `Quote::last_updated_at`.
//! Mapping and configuration errors are returned from `new` and `add`.

pub mod adapter;
pub mod adapters;
pub mod config;
pub mod constants;
pub mod error;
pub mod mapping;
pub mod metrics;
pub mod orderbook;
pub mod providers;
pub mod resolver;
pub mod scheduler;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use adapter::{AdapterSet, ExchangeAdapter};
pub use config::OrderBookConfig;
pub use error::{FetchError, MappingError, OrderBookError};
pub use mapping::MappingProvider;
pub use metrics::FetchMetrics;
pub use orderbook::OrderBook;
pub use types::{
    ComponentHealth, Exchange, HealthStatus, Level, MarketSymbol, Quote, TopOfBook, WatchedPair,
};
