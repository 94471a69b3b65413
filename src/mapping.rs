//! Pair-mapping provider abstraction
//!
//! A provider knows, per exchange, which exchange-native asset codes stand
//! behind each normalized `BASE/QUOTE` pair.

use crate::{
    error::MappingError,
    types::{Exchange, MarketSymbol},
};
use async_trait::async_trait;
use std::collections::HashMap;

/// Normalized pair (`BASE/QUOTE`) to the exchange's own asset codes
pub type ExchangeMapping = HashMap<String, MarketSymbol>;

/// Trait for pair-mapping providers
#[async_trait]
pub trait MappingProvider: Send + Sync {
    /// Fetches the complete mapping table for one exchange
    ///
    /// Called at most once per exchange per successful load; the resolver
    /// caches the result.
    async fn fetch_mappings(&self, exchange: Exchange) -> Result<ExchangeMapping, MappingError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}
