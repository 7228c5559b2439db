//! Upstream quote providers.
//!
//! This module contains:
//! - The [`BrokerSession`] and [`DelayedQuoteProvider`] seams the aggregator
//!   tiers are built on
//! - The Yahoo Finance delayed feed
//!
//! Providers receive already resolved identifiers. Mapping user symbols to
//! instrument keys or tickers happens in the resolver module.

mod traits;

pub mod yahoo;

pub use traits::{BrokerSession, DelayedQuoteProvider};
