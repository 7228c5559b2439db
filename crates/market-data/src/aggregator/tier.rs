use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::diagnostics::SkipReason;
use crate::errors::MarketDataError;
use crate::models::{Quote, Symbol};
use crate::resolver::NormalizedSymbol;

/// A symbol as handed to a tier: what the caller asked for, plus its
/// normalized form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TierSymbol {
    pub requested: Symbol,
    pub normalized: NormalizedSymbol,
}

/// One level of the quote fallback chain.
///
/// The aggregator calls tiers in order with a deadline already capped by
/// the request budget, and treats an elapsed deadline like any other
/// provider error. Tiers report per-symbol results; an error for one symbol
/// never affects the others.
#[async_trait]
pub trait QuoteTier: Send + Sync {
    /// Provider identifier, used for status tracking and diagnostics.
    fn id(&self) -> &str;

    /// The tier's own timeout for one attempt.
    fn timeout(&self) -> Duration;

    /// Whether the tier can be used at all right now.
    fn is_ready(&self) -> Result<(), SkipReason> {
        Ok(())
    }

    /// Fetch quotes for `symbols` in as few round-trips as possible.
    ///
    /// Returns exactly one result per input symbol, in input order.
    async fn attempt_batch(
        &self,
        symbols: &[TierSymbol],
        deadline: Instant,
    ) -> Vec<Result<Quote, MarketDataError>>;

    /// Fetch a quote for a single symbol.
    async fn attempt(
        &self,
        symbol: &TierSymbol,
        deadline: Instant,
    ) -> Result<Quote, MarketDataError> {
        self.attempt_batch(std::slice::from_ref(symbol), deadline)
            .await
            .into_iter()
            .next()
            .unwrap_or_else(|| {
                Err(MarketDataError::ProviderError {
                    provider: self.id().to_string(),
                    message: "Tier returned no result".to_string(),
                })
            })
    }
}
