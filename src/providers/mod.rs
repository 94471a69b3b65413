//! Pair-mapping provider implementations

pub mod cryptocompare;

pub use cryptocompare::CryptoCompareProvider;
