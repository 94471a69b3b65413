//! OKX top-of-book adapter

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

const RATE_LIMIT_CODE: &str = "50011";

#[derive(Debug, Deserialize)]
struct OkxResponse {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Vec<OkxBook>,
}

#[derive(Debug, Deserialize)]
struct OkxBook {
    bids: Vec<RawLevel>,
    asks: Vec<RawLevel>,
}

pub struct OkxAdapter {
    client: Client,
    base_url: String,
}

impl OkxAdapter {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl ExchangeAdapter for OkxAdapter {
    async fn fetch_top_of_book(&self, native_symbol: &str) -> Result<TopOfBook, FetchError> {
        let url = format!(
            "{}/api/v5/market/books?instId={}&sz=1",
            self.base_url, native_symbol
        );
        let response: OkxResponse = get_json(&self.client, &url).await?;

        match response.code.as_str() {
            "0" => {}
            RATE_LIMIT_CODE => return Err(FetchError::RateLimited),
            code => return Err(FetchError::Api(format!("code {}: {}", code, response.msg))),
        }

        let book = response
            .data
            .first()
            .ok_or_else(|| FetchError::InvalidResponse("empty data".to_string()))?;
        Ok(TopOfBook {
            bid: top_level(&book.bids, "bid")?,
            ask: top_level(&book.asks, "ask")?,
        })
    }

    fn exchange(&self) -> Exchange {
        Exchange::Okx
    }
}
