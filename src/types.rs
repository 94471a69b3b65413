//! Types for the top-of-book cache

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::OrderBookError;

/// Supported exchanges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Binance,
    Bybit,
    Gateio,
    Kraken,
    Kucoin,
    Okx,
}

impl Exchange {
    /// Get the lowercase exchange identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Binance => "binance",
            Exchange::Bybit => "bybit",
            Exchange::Gateio => "gateio",
            Exchange::Kraken => "kraken",
            Exchange::Kucoin => "kucoin",
            Exchange::Okx => "okx",
        }
    }

    /// Get the exchange name as CryptoCompare spells it
    pub fn cryptocompare_name(&self) -> &'static str {
        match self {
            Exchange::Binance => "Binance",
            Exchange::Bybit => "Bybit",
            Exchange::Gateio => "Gateio",
            Exchange::Kraken => "Kraken",
            Exchange::Kucoin => "Kucoin",
            Exchange::Okx => "OKX",
        }
    }

    /// Render the exchange's own base/quote codes as the symbol its REST API expects
    pub fn native_symbol(&self, symbol: &MarketSymbol) -> String {
        let (base, quote) = (&symbol.base, &symbol.quote);
        match self {
            Exchange::Binance | Exchange::Bybit | Exchange::Kraken => format!("{}{}", base, quote),
            Exchange::Gateio => format!("{}_{}", base, quote),
            Exchange::Kucoin | Exchange::Okx => format!("{}-{}", base, quote),
        }
    }

    /// Markdown link to the exchange's trading chart for `pair`
    pub fn chart_url(&self, pair: &str, symbol: &MarketSymbol) -> String {
        let (base, quote) = (&symbol.base, &symbol.quote);
        let url = match self {
            Exchange::Binance => format!("https://www.binance.com/en/trade/{}_{}", base, quote),
            Exchange::Bybit => format!("https://www.bybit.com/en/trade/spot/{}/{}", base, quote),
            Exchange::Gateio => format!("https://www.gate.io/trade/{}_{}", base, quote),
            Exchange::Kraken => {
                format!("https://trade.kraken.com/charts/KRAKEN:{}-{}", base, quote)
            }
            Exchange::Kucoin => format!("https://www.kucoin.com/trade/{}-{}", base, quote),
            Exchange::Okx => format!(
                "https://www.okx.com/trade-spot/{}-{}",
                base.to_lowercase(),
                quote.to_lowercase()
            ),
        };
        format!("[{}]({})", pair, url)
    }

    /// Get all supported exchanges
    pub fn all() -> &'static [Exchange] {
        &[
            Exchange::Binance,
            Exchange::Bybit,
            Exchange::Gateio,
            Exchange::Kraken,
            Exchange::Kucoin,
            Exchange::Okx,
        ]
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = OrderBookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        Exchange::all()
            .iter()
            .copied()
            .find(|e| e.as_str() == name)
            .ok_or_else(|| OrderBookError::configuration(format!("unsupported exchange: {}", s)))
    }
}

/// Normalizes a caller-supplied pair to `BASE/QUOTE`
///
/// Returns `None` unless the input has exactly one `/` with non-empty sides.
pub fn normalize_pair(pair: &str) -> Option<String> {
    let (base, quote) = pair.trim().split_once('/')?;
    let (base, quote) = (base.trim(), quote.trim());
    if base.is_empty() || quote.is_empty() || quote.contains('/') {
        return None;
    }
    Some(format!("{}/{}", base.to_uppercase(), quote.to_uppercase()))
}

/// Cache key: one exchange, one normalized pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    pub exchange: Exchange,
    pub pair: String,
}

impl PairKey {
    pub fn new(exchange: Exchange, pair: impl Into<String>) -> Self {
        Self {
            exchange,
            pair: pair.into(),
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.exchange, self.pair)
    }
}

/// An exchange's own base/quote asset codes for a pair (e.g. `VAI`/`USDT`
/// for the normalized `VAIOT/USDT` on Kucoin)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSymbol {
    pub base: String,
    pub quote: String,
}

impl MarketSymbol {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }
}

/// A pair registered for periodic fetching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedPair {
    pub key: PairKey,
    pub native_symbol: String,
}

impl WatchedPair {
    pub fn new(exchange: Exchange, pair: impl Into<String>, native_symbol: impl Into<String>) -> Self {
        Self {
            key: PairKey::new(exchange, pair),
            native_symbol: native_symbol.into(),
        }
    }

    pub fn exchange(&self) -> Exchange {
        self.key.exchange
    }

    pub fn pair(&self) -> &str {
        &self.key.pair
    }
}

/// One side of the top of book
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub price: f64,
    pub volume: f64,
}

/// Best bid and best ask as returned by an exchange adapter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopOfBook {
    pub bid: Level,
    pub ask: Level,
}

impl TopOfBook {
    pub fn new(bid_price: f64, bid_volume: f64, ask_price: f64, ask_volume: f64) -> Self {
        Self {
            bid: Level {
                price: bid_price,
                volume: bid_volume,
            },
            ask: Level {
                price: ask_price,
                volume: ask_volume,
            },
        }
    }
}

/// Latest cached top of book for a watched pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub bid_price: f64,
    pub bid_volume: f64,
    pub ask_price: f64,
    pub ask_volume: f64,

    /// When the poll loop last wrote this quote
    pub last_updated_at: DateTime<Utc>,
}

impl Quote {
    /// Create a quote stamped with the current time
    pub fn new(book: TopOfBook) -> Self {
        Self::at(book, Utc::now())
    }

    pub fn at(book: TopOfBook, last_updated_at: DateTime<Utc>) -> Self {
        Self {
            bid_price: book.bid.price,
            bid_volume: book.bid.volume,
            ask_price: book.ask.price,
            ask_volume: book.ask.volume,
            last_updated_at,
        }
    }

    /// Best bid as `(price, volume)`
    pub fn top_bid(&self) -> (f64, f64) {
        (self.bid_price, self.bid_volume)
    }

    /// Best ask as `(price, volume)`
    pub fn top_ask(&self) -> (f64, f64) {
        (self.ask_price, self.ask_volume)
    }

    /// Check if the quote is stale (older than threshold seconds)
    pub fn is_stale(&self, threshold_seconds: u64) -> bool {
        let age = Utc::now().signed_duration_since(self.last_updated_at);
        age.num_seconds() > threshold_seconds as i64
    }

    /// Get the age of the quote
    pub fn age(&self) -> std::time::Duration {
        Utc::now()
            .signed_duration_since(self.last_updated_at)
            .to_std()
            .unwrap_or_default()
    }
}

/// Overall health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Every watched pair has a fresh quote
    Healthy,
    /// Some quotes are missing or stale
    Degraded,
    /// Nothing usable is cached
    Unhealthy,
}

/// Component health information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional status message
    pub message: Option<String>,
    /// Component-specific details
    pub details: std::collections::HashMap<String, serde_json::Value>,
    /// Last checked timestamp
    pub last_checked: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_exchange_parse() {
        assert_eq!("binance".parse::<Exchange>().unwrap(), Exchange::Binance);
        assert_eq!(" KuCoin ".parse::<Exchange>().unwrap(), Exchange::Kucoin);
        assert!(matches!(
            "ftx".parse::<Exchange>(),
            Err(OrderBookError::Configuration(_))
        ));
    }

    #[test]
    fn test_native_symbol_formats() {
        let btc = MarketSymbol::new("BTC", "USDT");
        assert_eq!(Exchange::Binance.native_symbol(&btc), "BTCUSDT");
        assert_eq!(Exchange::Bybit.native_symbol(&btc), "BTCUSDT");
        assert_eq!(Exchange::Gateio.native_symbol(&btc), "BTC_USDT");
        assert_eq!(Exchange::Kucoin.native_symbol(&btc), "BTC-USDT");
        assert_eq!(Exchange::Okx.native_symbol(&btc), "BTC-USDT");
        assert_eq!(
            Exchange::Kraken.native_symbol(&MarketSymbol::new("XBT", "USD")),
            "XBTUSD"
        );
    }

    #[test]
    fn test_chart_url() {
        let vai = MarketSymbol::new("VAI", "USDT");
        assert_eq!(
            Exchange::Kucoin.chart_url("VAIOT/USDT", &vai),
            "[VAIOT/USDT](https://www.kucoin.com/trade/VAI-USDT)"
        );
    }

    #[test]
    fn test_normalize_pair() {
        assert_eq!(normalize_pair("btc/usdt").as_deref(), Some("BTC/USDT"));
        assert_eq!(normalize_pair(" ETH / BTC ").as_deref(), Some("ETH/BTC"));
        assert_eq!(normalize_pair("BTCUSDT"), None);
        assert_eq!(normalize_pair("/USDT"), None);
        assert_eq!(normalize_pair("A/B/C"), None);
    }

    #[test]
    fn test_quote_staleness() {
        let book = TopOfBook::new(1.0, 2.0, 1.1, 3.0);
        let fresh = Quote::new(book);
        assert!(!fresh.is_stale(60));
        assert_eq!(fresh.top_bid(), (1.0, 2.0));
        assert_eq!(fresh.top_ask(), (1.1, 3.0));

        let old = Quote::at(book, Utc::now() - Duration::seconds(120));
        assert!(old.is_stale(60));
        assert!(old.age().as_secs() >= 119);
    }
}
