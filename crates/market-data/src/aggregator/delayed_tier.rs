//! Tier B: public delayed feed.
//!
//! Delayed providers disagree on index naming, so each symbol carries an
//! ordered list of candidate tickers. Every round sends the next untried
//! candidate of each unresolved symbol in one batched call; a symbol whose
//! candidates all come back empty is reported as not found.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::time::Instant;

use super::budget::with_deadline;
use super::tier::{QuoteTier, TierSymbol};
use crate::errors::MarketDataError;
use crate::models::Quote;
use crate::provider::DelayedQuoteProvider;
use crate::resolver::delayed_tickers;

pub struct DelayedTier {
    provider: Arc<dyn DelayedQuoteProvider>,
    timeout: Duration,
}

impl DelayedTier {
    pub fn new(provider: Arc<dyn DelayedQuoteProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }
}

#[async_trait]
impl QuoteTier for DelayedTier {
    fn id(&self) -> &str {
        self.provider.id()
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn attempt_batch(
        &self,
        symbols: &[TierSymbol],
        deadline: Instant,
    ) -> Vec<Result<Quote, MarketDataError>> {
        let provider = self.provider.id();
        let candidates: Vec<Vec<String>> = symbols
            .iter()
            .map(|s| delayed_tickers(&s.normalized))
            .collect();
        let mut results: Vec<Option<Result<Quote, MarketDataError>>> = vec![None; symbols.len()];
        let mut round = 0;

        loop {
            let pending: Vec<(usize, &String)> = candidates
                .iter()
                .enumerate()
                .filter(|(idx, _)| results[*idx].is_none())
                .filter_map(|(idx, tickers)| tickers.get(round).map(|t| (idx, t)))
                .collect();
            if pending.is_empty() {
                break;
            }

            let mut tickers: Vec<String> = Vec::with_capacity(pending.len());
            for (_, ticker) in &pending {
                if !tickers.contains(*ticker) {
                    tickers.push((*ticker).clone());
                }
            }
            debug!(
                "{} round {}: requesting {}",
                provider,
                round + 1,
                tickers.join(",")
            );

            match with_deadline(provider, deadline, self.provider.fetch_quotes(&tickers)).await {
                Ok(quotes) => {
                    for (idx, ticker) in pending {
                        if let Some(raw) = quotes.get(ticker) {
                            results[idx] = Some(Ok(Quote::from_provider(
                                symbols[idx].requested.clone(),
                                raw.clone(),
                                provider,
                            )));
                        }
                    }
                }
                Err(e) => {
                    for (idx, _) in pending {
                        results[idx] = Some(Err(e.clone()));
                    }
                }
            }

            round += 1;
        }

        results
            .into_iter()
            .zip(symbols)
            .map(|(result, symbol)| {
                result.unwrap_or_else(|| {
                    Err(MarketDataError::SymbolNotFound(symbol.requested.to_string()))
                })
            })
            .collect()
    }
}
