//! Gate.io (v4, spot) top-of-book adapter

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

#[derive(Debug, Deserialize)]
struct OrderBookResponse {
    bids: Vec<RawLevel>,
    asks: Vec<RawLevel>,
}

pub struct GateioAdapter {
    client: Client,
    base_url: String,
}

impl GateioAdapter {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl ExchangeAdapter for GateioAdapter {
    async fn fetch_top_of_book(&self, native_symbol: &str) -> Result<TopOfBook, FetchError> {
        let url = format!(
            "{}/api/v4/spot/order_book?currency_pair={}&limit=1",
            self.base_url, native_symbol
        );
        let book: OrderBookResponse = get_json(&self.client, &url).await?;
        Ok(TopOfBook {
            bid: top_level(&book.bids, "bid")?,
            ask: top_level(&book.asks, "ask")?,
        })
    }

    fn exchange(&self) -> Exchange {
        Exchange::Gateio
    }
}
