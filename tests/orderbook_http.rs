//! End-to-end polling against wiremock stand-ins for CryptoCompare and the
//! exchange REST APIs.

use std::time::Duration;
use topbid::{Exchange, OrderBook, OrderBookConfig, OrderBookError};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_mappings(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/data/v2/pair/mapping/exchange"))
        .and(query_param("e", "Binance"))
        .and(header("authorization", "Apikey test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Response": "Success",
            "Data": { "current": [
                { "fsym": "BTC", "tsym": "USDT", "exchange_fsym": "BTC", "exchange_tsym": "USDT" },
                { "fsym": "ETH", "tsym": "USDT", "exchange_fsym": "ETH", "exchange_tsym": "USDT" }
            ]}
        })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/v2/pair/mapping/exchange"))
        .and(query_param("e", "Kucoin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Response": "Success",
            "Data": { "current": [
                { "fsym": "VAIOT", "tsym": "USDT", "exchange_fsym": "VAI", "exchange_tsym": "USDT" }
            ]}
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_books(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v3/depth"))
        .and(query_param("symbol", "BTCUSDT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "lastUpdateId": 1,
            "bids": [["23130.41", "0.05"]],
            "asks": [["23130.43", "0.02"]]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/depth"))
        .and(query_param("symbol", "ETHUSDT"))
        .respond_with(ResponseTemplate::new(503))
        .mount(server)
        .await;
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
        .mount(server)
        .await;
}

fn config(mapping: &MockServer, exchanges: &MockServer) -> OrderBookConfig {
    OrderBookConfig::default()
        .with_mapping_api_url(mapping.uri())
        .with_exchange_api_url(Exchange::Binance, exchanges.uri())
        .with_exchange_api_url(Exchange::Kucoin, exchanges.uri())
        .with_fetch_timeout(Duration::from_millis(500))
}

#[tokio::test]
async fn polls_top_of_book_over_http() {
    let mapping = MockServer::start().await;
    let exchanges = MockServer::start().await;
    mount_mappings(&mapping).await;
    mount_books(&exchanges).await;

    let book = OrderBook::with_config("test-key", ["binance", "kucoin"], config(&mapping, &exchanges))
        .await
        .unwrap();

    book.add_pairs("binance", ["BTC/USDT", "ETH/USDT"]).await.unwrap();
    book.add("kucoin", "VAIOT/USDT").await.unwrap();
    book.start(Duration::from_millis(50)).unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(
        book.get_orderbook_top_bid("binance", "BTC/USDT").unwrap(),
        (23130.41, 0.05)
    );
    assert_eq!(
        book.get_orderbook_top_ask("binance", "BTC/USDT").unwrap(),
        (23130.43, 0.02)
    );
    assert_eq!(
        book.get_orderbook_top_bid("kucoin", "VAIOT/USDT").unwrap(),
        (0.197007, 1300.0)
    );
    // The 503 on ETHUSDT never reaches the caller
    assert!(matches!(
        book.get_orderbook_top_bid("binance", "ETH/USDT"),
        Err(OrderBookError::NotAvailable { .. })
    ));

    book.stop().await;
    assert!(book.watched_pairs().is_empty());
    // `expect(1)` on the mapping mocks is verified when `mapping` drops
}

#[tokio::test]
async fn rejected_api_key_fails_construction() {
    let mapping = MockServer::start().await;
    let exchanges = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mapping)
        .await;

    let result =
        OrderBook::with_config("bad-key", ["binance"], config(&mapping, &exchanges)).await;
    assert!(matches!(result, Err(OrderBookError::Configuration(_))));
}
