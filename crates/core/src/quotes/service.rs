//! Quote service.
//!
//! Thin seam between the portfolio services and the market data aggregator,
//! so portfolio code can be tested against a fixed set of quotes.

use async_trait::async_trait;
use log::{debug, info};
use std::collections::HashMap;
use std::sync::Arc;

use tradedesk_market_data::{MarketDataAggregator, ProviderStatus, QuoteOutcome, Symbol};

/// Trait for quote lookups used by the portfolio services.
///
/// Lookups never fail: every symbol gets a [`QuoteOutcome`].
#[async_trait]
pub trait QuoteServiceTrait: Send + Sync {
    /// Get the quote for a symbol.
    async fn get_quote(&self, symbol: &Symbol) -> QuoteOutcome;

    /// Get quotes for multiple symbols in one pass.
    async fn get_quotes(&self, symbols: &[Symbol]) -> HashMap<Symbol, QuoteOutcome>;

    /// Provider/exchange pairs disabled after an authorization failure.
    fn unavailable_providers(&self) -> Vec<(String, String, ProviderStatus)> {
        Vec::new()
    }
}

/// Quote service backed by the tiered market data aggregator.
pub struct QuoteService {
    aggregator: Arc<MarketDataAggregator>,
}

impl QuoteService {
    pub fn new(aggregator: Arc<MarketDataAggregator>) -> Self {
        Self { aggregator }
    }
}

#[async_trait]
impl QuoteServiceTrait for QuoteService {
    async fn get_quote(&self, symbol: &Symbol) -> QuoteOutcome {
        self.aggregator.get_quote(symbol).await
    }

    async fn get_quotes(&self, symbols: &[Symbol]) -> HashMap<Symbol, QuoteOutcome> {
        if symbols.is_empty() {
            return HashMap::new();
        }

        let outcomes = self.aggregator.get_quotes(symbols).await;

        let live = outcomes.values().filter(|o| o.is_live()).count();
        let cached = outcomes
            .values()
            .filter(|o| matches!(o, QuoteOutcome::Cached(_)))
            .count();
        let missing = outcomes.len() - live - cached;
        if cached + missing > 0 {
            info!(
                "Quotes for {} symbols: {} live, {} cached, {} unavailable",
                outcomes.len(),
                live,
                cached,
                missing
            );
        } else {
            debug!("Quotes for {} symbols: all live", outcomes.len());
        }

        outcomes
    }

    fn unavailable_providers(&self) -> Vec<(String, String, ProviderStatus)> {
        self.aggregator.provider_status().unavailable()
    }
}
