//! In-memory quote store
//!
//! Watched pairs and their quotes live behind one mutex, so a quote can only
//! exist for a pair that is currently watched and readers never see a
//! partially written quote. The lock is never held across an `.await`.

use crate::{
    error::OrderBookError,
    types::{PairKey, Quote, WatchedPair},
};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
struct BookState {
    /// Watched pair -> native symbol it was resolved to
    watched: HashMap<PairKey, String>,
    quotes: HashMap<PairKey, Quote>,
    /// Set once the owning scheduler has stopped; no pair can be watched again
    closed: bool,
}

/// Concurrent cache of the latest quote per (exchange, pair)
#[derive(Default)]
pub struct QuoteStore {
    state: Mutex<BookState>,
}

impl QuoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pair for polling
    ///
    /// Returns false (and changes nothing) if the pair is already watched.
    /// Fails with `SchedulerStopped` once the store has been closed.
    pub fn watch(&self, pair: &WatchedPair) -> Result<bool, OrderBookError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(OrderBookError::SchedulerStopped);
        }
        if state.watched.contains_key(&pair.key) {
            return Ok(false);
        }
        state
            .watched
            .insert(pair.key.clone(), pair.native_symbol.clone());
        Ok(true)
    }

    /// Stops watching a pair and drops its quote
    pub fn unwatch(&self, key: &PairKey) -> bool {
        let mut state = self.state.lock();
        state.quotes.remove(key);
        state.watched.remove(key).is_some()
    }

    pub fn is_watched(&self, key: &PairKey) -> bool {
        self.state.lock().watched.contains_key(key)
    }

    /// Snapshot of the watched pairs, ordered by exchange then pair
    pub fn watched(&self) -> Vec<WatchedPair> {
        let state = self.state.lock();
        let mut pairs: Vec<_> = state
            .watched
            .iter()
            .map(|(key, native_symbol)| WatchedPair {
                key: key.clone(),
                native_symbol: native_symbol.clone(),
            })
            .collect();
        drop(state);
        pairs.sort_by(|a, b| a.key.cmp(&b.key));
        pairs
    }

    pub fn watched_count(&self) -> usize {
        self.state.lock().watched.len()
    }

    /// Replaces the quote for a watched pair
    ///
    /// The write is discarded (returns false) if the pair has been deleted, or
    /// re-added under a different native symbol, since the fetch started.
    pub fn set(&self, pair: &WatchedPair, quote: Quote) -> bool {
        let mut state = self.state.lock();
        match state.watched.get(&pair.key) {
            Some(native_symbol) if *native_symbol == pair.native_symbol => {
                state.quotes.insert(pair.key.clone(), quote);
                true
            }
            _ => false,
        }
    }

    /// Gets the latest quote for a pair
    pub fn get(&self, key: &PairKey) -> Result<Quote, OrderBookError> {
        let state = self.state.lock();
        if !state.watched.contains_key(key) {
            return Err(OrderBookError::pair_not_watched(key.exchange, &key.pair));
        }
        state
            .quotes
            .get(key)
            .cloned()
            .ok_or_else(|| OrderBookError::not_available(key.exchange, &key.pair))
    }

    /// Best bid as `(price, volume)`
    pub fn top_bid(&self, key: &PairKey) -> Result<(f64, f64), OrderBookError> {
        self.get(key).map(|quote| quote.top_bid())
    }

    /// Best ask as `(price, volume)`
    pub fn top_ask(&self, key: &PairKey) -> Result<(f64, f64), OrderBookError> {
        self.get(key).map(|quote| quote.top_ask())
    }

    /// Every watched pair with its quote, if any
    pub fn entries(&self) -> Vec<(WatchedPair, Option<Quote>)> {
        let state = self.state.lock();
        state
            .watched
            .iter()
            .map(|(key, native_symbol)| {
                (
                    WatchedPair {
                        key: key.clone(),
                        native_symbol: native_symbol.clone(),
                    },
                    state.quotes.get(key).cloned(),
                )
            })
            .collect()
    }

    /// Forgets every watched pair and quote and refuses further `watch` calls
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.watched.clear();
        state.quotes.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}
