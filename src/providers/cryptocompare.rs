//! CryptoCompare pair-mapping provider implementation

use crate::{
    constants::{CRYPTOCOMPARE_PAIR_MAPPING_ENDPOINT, USER_AGENT},
    error::MappingError,
    mapping::{ExchangeMapping, MappingProvider},
    types::{Exchange, MarketSymbol},
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// CryptoCompare API envelope
#[derive(Debug, Deserialize)]
struct CryptoCompareResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Message", default)]
    message: String,
    #[serde(rename = "Data", default)]
    data: Option<PairMappingData>,
}

#[derive(Debug, Deserialize)]
struct PairMappingData {
    #[serde(default)]
    current: Vec<PairMapping>,
}

#[derive(Debug, Deserialize)]
struct PairMapping {
    fsym: String,
    tsym: String,
    exchange_fsym: String,
    exchange_tsym: String,
}

/// CryptoCompare mapping provider
pub struct CryptoCompareProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl CryptoCompareProvider {
    /// Creates a new CryptoCompare provider
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MappingError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(MappingError::Network)?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
        })
    }

    /// Builds the pair-mapping URL for one exchange
    fn build_url(&self, exchange: Exchange) -> String {
        format!(
            "{}{}?e={}",
            self.base_url.trim_end_matches('/'),
            CRYPTOCOMPARE_PAIR_MAPPING_ENDPOINT,
            exchange.cryptocompare_name()
        )
    }

    /// Parses the mapping list into a normalized-pair table
    fn parse_response(&self, data: PairMappingData) -> ExchangeMapping {
        data.current
            .into_iter()
            .map(|m| {
                (
                    format!("{}/{}", m.fsym, m.tsym),
                    MarketSymbol::new(m.exchange_fsym, m.exchange_tsym),
                )
            })
            .collect()
    }
}

#[async_trait]
impl MappingProvider for CryptoCompareProvider {
    async fn fetch_mappings(&self, exchange: Exchange) -> Result<ExchangeMapping, MappingError> {
        let url = self.build_url(exchange);
        tracing::debug!(%exchange, %url, "Fetching pair mappings from CryptoCompare");

        let response = self
            .client
            .get(&url)
            .header("authorization", format!("Apikey {}", self.api_key))
            .send()
            .await
            .map_err(MappingError::Network)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(MappingError::Unauthorized(format!("HTTP {}", status)));
        }

        if !status.is_success() {
            return Err(MappingError::Api(format!(
                "HTTP {}: {}",
                status,
                response.text().await.unwrap_or_default()
            )));
        }

        let response_text = response.text().await.map_err(MappingError::Network)?;

        let parsed: CryptoCompareResponse =
            serde_json::from_str(&response_text).map_err(|e| {
                MappingError::InvalidResponse(format!(
                    "Failed to parse CryptoCompare response: {}. Response: {}",
                    e, response_text
                ))
            })?;

        if parsed.response != "Success" {
            let lowered = parsed.message.to_lowercase();
            if lowered.contains("api key") || lowered.contains("api_key") {
                return Err(MappingError::Unauthorized(parsed.message));
            }
            return Err(MappingError::Api(parsed.message));
        }

        let mappings = parsed
            .data
            .map(|data| self.parse_response(data))
            .unwrap_or_default();

        if mappings.is_empty() {
            return Err(MappingError::UnsupportedExchange(exchange.to_string()));
        }

        Ok(mappings)
    }

    fn provider_name(&self) -> &'static str {
        "cryptocompare"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> CryptoCompareProvider {
        CryptoCompareProvider::new("cmp_api_key", server.uri(), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_mappings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/v2/pair/mapping/exchange"))
            .and(query_param("e", "Kucoin"))
            .and(header("authorization", "Apikey cmp_api_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Response": "Success",
                "Data": {
                    "current": [{
                        "exchange": "Kucoin",
                        "exchange_fsym": "VAI",
                        "exchange_tsym": "USDT",
                        "fsym": "VAIOT",
                        "last_update": 1620315177.95121,
                        "tsym": "USDT"
                    }]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mappings = provider(&server)
            .fetch_mappings(Exchange::Kucoin)
            .await
            .unwrap();
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings["VAIOT/USDT"], MarketSymbol::new("VAI", "USDT"));
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = provider(&server)
            .fetch_mappings(Exchange::Binance)
            .await
            .unwrap_err();
        assert!(matches!(err, MappingError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Response": "Error",
                "Message": "e param is not valid the market does not exist",
                "Data": {}
            })))
            .mount(&server)
            .await;

        let err = provider(&server)
            .fetch_mappings(Exchange::Okx)
            .await
            .unwrap_err();
        assert!(matches!(err, MappingError::Api(_)));
    }

    #[tokio::test]
    async fn test_empty_table_is_unsupported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Response": "Success",
                "Data": { "current": [] }
            })))
            .mount(&server)
            .await;

        let err = provider(&server)
            .fetch_mappings(Exchange::Gateio)
            .await
            .unwrap_err();
        assert!(matches!(err, MappingError::UnsupportedExchange(_)));
    }
}
