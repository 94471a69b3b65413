//! Exchange REST adapter implementations

pub mod binance;
pub mod bybit;
pub mod gateio;
pub mod kraken;
pub mod kucoin;
pub mod okx;

pub use binance::BinanceAdapter;
pub use bybit::BybitAdapter;
pub use gateio::GateioAdapter;
pub use kraken::KrakenAdapter;
pub use kucoin::KucoinAdapter;
pub use okx::OkxAdapter;

use crate::{constants::USER_AGENT, error::FetchError, types::Level};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// One order-book level as exchanges send it: `[price, size, ...]`, with
/// numbers encoded either as strings or as JSON numbers
pub(crate) type RawLevel = Vec<serde_json::Value>;

pub(crate) fn http_client(timeout: Duration) -> Result<Client, FetchError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(FetchError::Network)
}

fn request_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(e)
    }
}

/// GETs `url` and decodes the JSON body, classifying HTTP failures
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
) -> Result<T, FetchError> {
    let response = client.get(url).send().await.map_err(request_error)?;

    // Check for rate limiting
    if response.status().as_u16() == 429 {
        return Err(FetchError::RateLimited);
    }

    if !response.status().is_success() {
        return Err(FetchError::Api(format!(
            "HTTP {}: {}",
            response.status(),
            response.text().await.unwrap_or_default()
        )));
    }

    let body = response.text().await.map_err(request_error)?;
    serde_json::from_str(&body).map_err(|e| {
        FetchError::InvalidResponse(format!("Failed to parse response: {}. Response: {}", e, body))
    })
}

fn number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::String(s) => s.parse().ok(),
        serde_json::Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// First level of one side of a book
pub(crate) fn top_level(levels: &[RawLevel], side: &str) -> Result<Level, FetchError> {
    let level = levels
        .first()
        .ok_or_else(|| FetchError::InvalidResponse(format!("empty {} side", side)))?;
    match (level.first().and_then(number), level.get(1).and_then(number)) {
        (Some(price), Some(volume)) => Ok(Level { price, volume }),
        _ => Err(FetchError::InvalidResponse(format!(
            "malformed {} level: {:?}",
            side, level
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_top_level_accepts_strings_and_numbers() {
        let levels: Vec<RawLevel> = vec![vec![json!("23130.41"), json!(0.05), json!(1675853445)]];
        let level = top_level(&levels, "bid").unwrap();
        assert_eq!(level, Level { price: 23130.41, volume: 0.05 });
    }

    #[test]
    fn test_top_level_rejects_empty_and_malformed() {
        assert!(matches!(
            top_level(&[], "ask"),
            Err(FetchError::InvalidResponse(_))
        ));
        let levels: Vec<RawLevel> = vec![vec![json!("abc"), json!("1")]];
        assert!(matches!(
            top_level(&levels, "ask"),
            Err(FetchError::InvalidResponse(_))
        ));
    }
}
