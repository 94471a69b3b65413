//! Bybit (v5, spot) top-of-book adapter

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

/// Bybit signals rate limiting in the body, not the status code
const RATE_LIMIT_RET_CODE: i64 = 10006;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BybitResponse {
    ret_code: i64,
    #[serde(default)]
    ret_msg: String,
    result: Option<BybitBook>,
}

#[derive(Debug, Deserialize)]
struct BybitBook {
    #[serde(default)]
    b: Vec<RawLevel>,
    #[serde(default)]
    a: Vec<RawLevel>,
}

pub struct BybitAdapter {
    client: Client,
    base_url: String,
}

impl BybitAdapter {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl ExchangeAdapter for BybitAdapter {
    async fn fetch_top_of_book(&self, native_symbol: &str) -> Result<TopOfBook, FetchError> {
        let url = format!(
            "{}/v5/market/orderbook?category=spot&symbol={}&limit=1",
            self.base_url, native_symbol
        );
        let response: BybitResponse = get_json(&self.client, &url).await?;

        match response.ret_code {
            0 => {}
            RATE_LIMIT_RET_CODE => return Err(FetchError::RateLimited),
            code => {
                return Err(FetchError::Api(format!(
                    "retCode {}: {}",
                    code, response.ret_msg
                )))
            }
        }

        let book = response
            .result
            .ok_or_else(|| FetchError::InvalidResponse("missing result".to_string()))?;
        Ok(TopOfBook {
            bid: top_level(&book.b, "bid")?,
            ask: top_level(&book.a, "ask")?,
        })
    }

    fn exchange(&self) -> Exchange {
        Exchange::Bybit
    }
}
