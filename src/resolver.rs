//! Normalized pair to exchange-native symbol resolution
//!
//! Each exchange's mapping table is fetched from the provider on first use
//! and kept for the lifetime of the resolver. Concurrent first lookups for
//! the same exchange share a single outbound call; a failed load caches
//! nothing, so the next lookup retries.

use crate::{
    error::OrderBookError,
    mapping::{ExchangeMapping, MappingProvider},
    types::{normalize_pair, Exchange, MarketSymbol},
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;

type TableSlot = Arc<OnceCell<Arc<ExchangeMapping>>>;

pub struct TickerResolver {
    provider: Arc<dyn MappingProvider>,
    tables: RwLock<HashMap<Exchange, TableSlot>>,
}

impl TickerResolver {
    pub fn new(provider: Arc<dyn MappingProvider>) -> Self {
        Self {
            provider,
            tables: RwLock::new(HashMap::new()),
        }
    }

    fn slot(&self, exchange: Exchange) -> TableSlot {
        if let Some(slot) = self.tables.read().get(&exchange) {
            return slot.clone();
        }
        self.tables.write().entry(exchange).or_default().clone()
    }

    /// Returns the mapping table for `exchange`, loading it if needed
    async fn table(&self, exchange: Exchange) -> Result<Arc<ExchangeMapping>, OrderBookError> {
        let slot = self.slot(exchange);
        let table = slot
            .get_or_try_init(|| async {
                let mappings = self
                    .provider
                    .fetch_mappings(exchange)
                    .await
                    .map_err(|e| OrderBookError::from_mapping(exchange, e))?;
                tracing::info!(
                    %exchange,
                    provider = self.provider.provider_name(),
                    pairs = mappings.len(),
                    "Saved pair mappings"
                );
                Ok::<_, OrderBookError>(Arc::new(mappings))
            })
            .await?;
        Ok(table.clone())
    }

    /// Loads the mapping table for `exchange` without resolving anything
    pub async fn preload(&self, exchange: Exchange) -> Result<(), OrderBookError> {
        self.table(exchange).await.map(|_| ())
    }

    /// True once the table for `exchange` has been loaded
    pub fn is_loaded(&self, exchange: Exchange) -> bool {
        self.tables
            .read()
            .get(&exchange)
            .is_some_and(|slot| slot.initialized())
    }

    /// Looks up the exchange's own base/quote codes for `pair`
    pub async fn market_symbol(
        &self,
        exchange: Exchange,
        pair: &str,
    ) -> Result<MarketSymbol, OrderBookError> {
        let normalized =
            normalize_pair(pair).ok_or_else(|| OrderBookError::pair_unavailable(exchange, pair))?;
        let table = self.table(exchange).await?;
        table
            .get(&normalized)
            .cloned()
            .ok_or_else(|| OrderBookError::pair_unavailable(exchange, &normalized))
    }

    /// Resolves `pair` to the symbol `exchange`'s REST API expects
    pub async fn resolve(&self, exchange: Exchange, pair: &str) -> Result<String, OrderBookError> {
        let symbol = self.market_symbol(exchange, pair).await?;
        Ok(exchange.native_symbol(&symbol))
    }
}
