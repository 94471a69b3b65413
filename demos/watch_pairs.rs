use std::time::Duration;
use topbid::{OrderBook, OrderBookError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Build the order book
    // Pair mappings for every exchange are loaded from CryptoCompare here.
    let api_key = std::env::var("CRYPTOCOMPARE_API_KEY")?;
    let book = OrderBook::new(&api_key, ["binance", "kucoin"]).await?;

    println!("Watching top of book on {:?}", book.exchanges());
    println!("-------------------------------------------");

    // 2. Register pairs and start polling
    book.add_pairs("binance", ["BTC/USDT", "ETH/USDT"]).await?;
    book.add("kucoin", "BTC/USDT").await?;
    book.start(Duration::from_secs(1))?;

    // 3. Print quotes as they arrive
    for _ in 0..5 {
        tokio::time::sleep(Duration::from_secs(2)).await;
        for pair in book.watched_pairs() {
            let exchange = pair.key.exchange.as_str();
            match (
                book.get_orderbook_top_bid(exchange, &pair.key.pair),
                book.get_orderbook_top_ask(exchange, &pair.key.pair),
            ) {
                (Ok((bid, bid_vol)), Ok((ask, ask_vol))) => println!(
                    "   {:<8} {:<10} bid {} x {}   ask {} x {}",
                    exchange, pair.key.pair, bid, bid_vol, ask, ask_vol
                ),
                (Err(OrderBookError::NotAvailable { .. }), _) => {
                    println!("   {:<8} {:<10} no quote yet", exchange, pair.key.pair)
                }
                (Err(e), _) | (_, Err(e)) => eprintln!("   Error: {}", e),
            }
        }
        println!();
    }

    // 4. Shut down
    book.stop().await;
    println!("Stopped.");
    Ok(())
}
