//! KuCoin top-of-book adapter

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

const SUCCESS_CODE: &str = "200000";
const RATE_LIMIT_CODE: &str = "429000";

#[derive(Debug, Deserialize)]
struct KucoinResponse {
    code: String,
    #[serde(default)]
    msg: String,
    data: Option<KucoinBook>,
}

/// KuCoin sends `null` sides for symbols without liquidity
#[derive(Debug, Deserialize)]
struct KucoinBook {
    bids: Option<Vec<RawLevel>>,
    asks: Option<Vec<RawLevel>>,
}

pub struct KucoinAdapter {
    client: Client,
    base_url: String,
}

impl KucoinAdapter {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl ExchangeAdapter for KucoinAdapter {
    async fn fetch_top_of_book(&self, native_symbol: &str) -> Result<TopOfBook, FetchError> {
        let url = format!(
            "{}/api/v1/market/orderbook/level2_20?symbol={}",
            self.base_url, native_symbol
        );
        let response: KucoinResponse = get_json(&self.client, &url).await?;

        match response.code.as_str() {
            SUCCESS_CODE => {}
            RATE_LIMIT_CODE => return Err(FetchError::RateLimited),
            code => return Err(FetchError::Api(format!("code {}: {}", code, response.msg))),
        }

        let book = response
            .data
            .ok_or_else(|| FetchError::InvalidResponse("missing data".to_string()))?;
        Ok(TopOfBook {
            bid: top_level(book.bids.as_deref().unwrap_or_default(), "bid")?,
            ask: top_level(book.asks.as_deref().unwrap_or_default(), "ask")?,
        })
    }

    fn exchange(&self) -> Exchange {
        Exchange::Kucoin
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
            .and(path("/api/v1/market/orderbook/level2_20"))
            .and(query_param("symbol", "VAI-USDT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": "200000",
                "data": {
                    "time": 1675853445037u64,
                    "sequence": "47221666",
                    "bids": [["0.197007", "1300"], ["0.197", "202.6394"]],
                    "asks": [["0.197607", "1506.5178"], ["0.197608", "1300"]]
                }
            })))
            .mount(&server)
            .await;

        let adapter = KucoinAdapter::new(server.uri(), Duration::from_secs(2)).unwrap();
        let book = adapter.fetch_top_of_book("VAI-USDT").await.unwrap();
        assert_eq!(book, TopOfBook::new(0.197007, 1300.0, 0.197607, 1506.5178));
    }

    #[tokio::test]
    async fn test_null_bids_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": "200000",
                "data": { "time": 1675853445037u64, "sequence": "1", "bids": null, "asks": null }
            })))
            .mount(&server)
            .await;

        let adapter = KucoinAdapter::new(server.uri(), Duration::from_secs(2)).unwrap();
        let err = adapter.fetch_top_of_book("VAI-USDT").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidResponse(_)));
    }
}
