//! Binance top-of-book adapter

use super::{get_json, http_client, top_level, RawLevel};
use crate::{
    adapter::ExchangeAdapter,
    error::FetchError,
    types::{Exchange, TopOfBook},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Binance `/api/v3/depth` response
#[derive(Debug, Deserialize)]
struct DepthResponse {
    bids: Vec<RawLevel>,
    asks: Vec<RawLevel>,
}

pub struct BinanceAdapter {
    client: Client,
    base_url: String,
}

impl BinanceAdapter {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl ExchangeAdapter for BinanceAdapter {
    async fn fetch_top_of_book(&self, native_symbol: &str) -> Result<TopOfBook, FetchError> {
        let url = format!(
            "{}/api/v3/depth?limit=1&symbol={}",
            self.base_url, native_symbol
        );
        let depth: DepthResponse = get_json(&self.client, &url).await?;
        Ok(TopOfBook {
            bid: top_level(&depth.bids, "bid")?,
            ask: top_level(&depth.asks, "ask")?,
        })
    }

    fn exchange(&self) -> Exchange {
        Exchange::Binance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_top_of_book() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/depth"))
            .and(query_param("symbol", "BTCUSDT"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "lastUpdateId": 1027024,
                "bids": [["23130.41000000", "0.05000000"]],
                "asks": [["23130.43000000", "0.02000000"]]
            })))
            .mount(&server)
            .await;

        let adapter = BinanceAdapter::new(server.uri(), Duration::from_secs(2)).unwrap();
        let book = adapter.fetch_top_of_book("BTCUSDT").await.unwrap();
        assert_eq!(book, TopOfBook::new(23130.41, 0.05, 23130.43, 0.02));
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let adapter = BinanceAdapter::new(server.uri(), Duration::from_secs(2)).unwrap();
        let err = adapter.fetch_top_of_book("BTCUSDT").await.unwrap_err();
        assert!(matches!(err, FetchError::RateLimited));
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "bids": [], "asks": [] }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let adapter = BinanceAdapter::new(server.uri(), Duration::from_millis(50)).unwrap();
        let err = adapter.fetch_top_of_book("BTCUSDT").await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout));
    }
}
