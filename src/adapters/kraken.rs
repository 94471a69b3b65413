//! Kraken top-of-book adapter

use super::{get_json, http_client, top_level, RawLevel};
use crate::{
    adapter::ExchangeAdapter,
    error::FetchError,
    types::{Exchange, TopOfBook},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Kraken `/0/public/Depth` response
///
/// `result` is keyed by Kraken's internal pair name (e.g. `XXBTZUSD`),
/// which need not match the requested symbol.
#[derive(Debug, Deserialize)]
struct DepthResponse {
    #[serde(default)]
    error: Vec<String>,
    #[serde(default)]
    result: HashMap<String, KrakenBook>,
}

#[derive(Debug, Deserialize)]
struct KrakenBook {
    bids: Vec<RawLevel>,
    asks: Vec<RawLevel>,
}

pub struct KrakenAdapter {
    client: Client,
    base_url: String,
}

impl KrakenAdapter {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl ExchangeAdapter for KrakenAdapter {
    async fn fetch_top_of_book(&self, native_symbol: &str) -> Result<TopOfBook, FetchError> {
        let url = format!(
            "{}/0/public/Depth?count=1&pair={}",
            self.base_url, native_symbol
        );
        let depth: DepthResponse = get_json(&self.client, &url).await?;

        if !depth.error.is_empty() {
            if depth.error.iter().any(|e| e.contains("Rate limit")) {
                return Err(FetchError::RateLimited);
            }
            return Err(FetchError::Api(depth.error.join(", ")));
        }

        let book = depth
            .result
            .values()
            .next()
            .ok_or_else(|| FetchError::InvalidResponse("empty result".to_string()))?;
        Ok(TopOfBook {
            bid: top_level(&book.bids, "bid")?,
            ask: top_level(&book.asks, "ask")?,
        })
    }

    fn exchange(&self) -> Exchange {
        Exchange::Kraken
    }
}
