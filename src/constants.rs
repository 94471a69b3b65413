//! Constants for the top-of-book cache
//!
//! Compile-time defaults. `OrderBookConfig` starts from these and may be
//! overridden at runtime (see `config.rs`).

/// Per-fetch timeout applied to every exchange request (in milliseconds)
pub const FETCH_TIMEOUT_MS: u64 = 1_000;

/// HTTP timeout for the pair-mapping provider (in seconds)
pub const MAPPING_TIMEOUT_SECS: u64 = 10;

/// Upper bound on concurrent exchange requests within one poll cycle
pub const MAX_CONCURRENT_FETCHES: usize = 8;

/// How long before a quote is reported as stale by `health_check` (in seconds)
pub const STALE_THRESHOLD_SECS: u64 = 60;

/// Extra time `stop()` waits for the worker beyond the fetch timeout (in milliseconds)
pub const SHUTDOWN_GRACE_MS: u64 = 250;

/// CryptoCompare API base URL
pub const CRYPTOCOMPARE_API_URL: &str = "https://min-api.cryptocompare.com";

/// CryptoCompare endpoint listing pair mappings for one exchange
pub const CRYPTOCOMPARE_PAIR_MAPPING_ENDPOINT: &str = "/data/v2/pair/mapping/exchange";

pub const BINANCE_API_URL: &str = "https://api.binance.com";
pub const BYBIT_API_URL: &str = "https://api.bybit.com";
pub const GATEIO_API_URL: &str = "https://api.gateio.ws";
pub const KRAKEN_API_URL: &str = "https://api.kraken.com";
pub const KUCOIN_API_URL: &str = "https://api.kucoin.com";
pub const OKX_API_URL: &str = "https://www.okx.com";

/// User agent for HTTP requests
pub const USER_AGENT: &str = "topbid/0.1.0";
