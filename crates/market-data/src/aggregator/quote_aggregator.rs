use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};
use tokio::time::timeout_at;

use super::budget::Budget;
use super::broker_tier::BrokerTier;
use super::cache::QuoteCache;
use super::config::AggregatorConfig;
use super::delayed_tier::DelayedTier;
use super::diagnostics::{FetchDiagnostics, SkipReason};
use super::tier::{QuoteTier, TierSymbol};
use crate::errors::{MarketDataError, RetryClass};
use crate::models::{Quote, QuoteOutcome, Symbol};
use crate::provider::{BrokerSession, DelayedQuoteProvider};
use crate::resolver::{InstrumentResolver, ProviderStatus, ProviderStatusTable};

/// Per-symbol state while a request walks the tiers.
struct Pending {
    symbol: TierSymbol,
    diagnostics: FetchDiagnostics,
    live: Option<Quote>,
    not_found: bool,
}

impl Pending {
    fn is_done(&self) -> bool {
        self.live.is_some() || self.not_found
    }
}

/// Outcome of one symbol together with its tier attempt trail.
#[derive(Clone, Debug)]
pub struct QuoteReport {
    pub outcome: QuoteOutcome,
    pub diagnostics: FetchDiagnostics,
}

/// Tiered quote fetching with a bounded worst case.
///
/// Tiers are tried in order for every symbol that is still unresolved.
/// Each tier gets one batched call per request, under a deadline capped by
/// the shared [`Budget`]. When every live tier fails the last cached quote
/// is served with `stale = true`.
///
/// Fallthrough per error class:
///
/// | Error | Effect |
/// |-------|--------|
/// | `SymbolNotFound` | remaining live tiers skipped, cache consulted |
/// | `Unauthorized` | provider marked unavailable for the exchange, next tier |
/// | anything else, including timeouts | next tier |
pub struct MarketDataAggregator {
    tiers: Vec<Arc<dyn QuoteTier>>,
    resolver: Arc<InstrumentResolver>,
    cache: QuoteCache,
    config: AggregatorConfig,
}

impl MarketDataAggregator {
    /// Aggregator with no tiers; add them with [`with_tier`](Self::with_tier).
    pub fn new(resolver: Arc<InstrumentResolver>, config: AggregatorConfig) -> Self {
        Self {
            tiers: Vec::new(),
            resolver,
            cache: QuoteCache::new(),
            config,
        }
    }

    /// The usual chain: broker feed when a session exists, then the
    /// delayed feed, then the cache.
    pub fn with_providers(
        resolver: Arc<InstrumentResolver>,
        config: AggregatorConfig,
        broker: Option<Arc<dyn BrokerSession>>,
        delayed: Option<Arc<dyn DelayedQuoteProvider>>,
    ) -> Self {
        let mut aggregator = Self::new(resolver.clone(), config.clone());
        if let Some(session) = broker {
            aggregator = aggregator.with_tier(Arc::new(BrokerTier::new(
                session,
                resolver,
                config.broker_timeout(),
            )));
        }
        if let Some(provider) = delayed {
            aggregator = aggregator.with_tier(Arc::new(DelayedTier::new(
                provider,
                config.delayed_timeout(),
            )));
        }
        aggregator
    }

    /// Append a tier after the existing ones.
    pub fn with_tier(mut self, tier: Arc<dyn QuoteTier>) -> Self {
        self.tiers.push(tier);
        self
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn resolver(&self) -> &Arc<InstrumentResolver> {
        &self.resolver
    }

    pub fn provider_status(&self) -> &Arc<ProviderStatusTable> {
        self.resolver.status_table()
    }

    /// Quote for one symbol. Never fails and never waits past the
    /// configured overall ceiling.
    pub async fn get_quote(&self, symbol: &Symbol) -> QuoteOutcome {
        self.get_quotes(std::slice::from_ref(symbol))
            .await
            .remove(symbol)
            .unwrap_or(QuoteOutcome::NoData)
    }

    /// Quotes for many symbols, each with its own outcome.
    pub async fn get_quotes(&self, symbols: &[Symbol]) -> HashMap<Symbol, QuoteOutcome> {
        self.get_quotes_with_diagnostics(symbols)
            .await
            .into_iter()
            .map(|(symbol, report)| (symbol, report.outcome))
            .collect()
    }

    /// Quotes plus the per-tier attempt trail of every symbol.
    pub async fn get_quotes_with_diagnostics(
        &self,
        symbols: &[Symbol],
    ) -> HashMap<Symbol, QuoteReport> {
        let budget = Budget::new(self.config.overall_ceiling());

        let mut pending: Vec<Pending> = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            if pending.iter().any(|p| &p.symbol.requested == symbol) {
                continue;
            }
            let normalized = self.resolver.normalize(symbol, None);
            let not_found = normalized.root.is_empty();
            pending.push(Pending {
                symbol: TierSymbol {
                    requested: symbol.clone(),
                    normalized,
                },
                diagnostics: FetchDiagnostics::new(),
                live: None,
                not_found,
            });
        }

        for tier in &self.tiers {
            self.run_tier(tier.as_ref(), &budget, &mut pending).await;
        }

        pending
            .into_iter()
            .map(|p| {
                let outcome = self.finish(&p);
                debug!(
                    "Quote for {}: {} [{}]",
                    p.symbol.requested,
                    outcome_label(&outcome),
                    p.diagnostics.summary()
                );
                (
                    p.symbol.requested,
                    QuoteReport {
                        outcome,
                        diagnostics: p.diagnostics,
                    },
                )
            })
            .collect()
    }

    async fn run_tier(&self, tier: &dyn QuoteTier, budget: &Budget, pending: &mut [Pending]) {
        let id = tier.id();
        let status = self.resolver.status_table();

        for p in pending.iter_mut().filter(|p| p.not_found && p.live.is_none()) {
            p.diagnostics.record_skip(id, SkipReason::ShortCircuited);
        }

        let open: Vec<usize> = (0..pending.len())
            .filter(|idx| !pending[*idx].is_done())
            .collect();
        if open.is_empty() {
            return;
        }

        let skip = if budget.is_exhausted() {
            Some(SkipReason::BudgetExhausted)
        } else {
            tier.is_ready().err()
        };
        if let Some(reason) = skip {
            for idx in open {
                pending[idx].diagnostics.record_skip(id, reason.clone());
            }
            return;
        }

        let mut batch: Vec<usize> = Vec::with_capacity(open.len());
        for idx in open {
            let exchange = &pending[idx].symbol.normalized.exchange;
            match status.status(id, exchange) {
                ProviderStatus::Available => batch.push(idx),
                ProviderStatus::Unavailable { reason, .. } => pending[idx]
                    .diagnostics
                    .record_skip(id, SkipReason::ProviderUnavailable { reason }),
            }
        }
        if batch.is_empty() {
            return;
        }

        let symbols: Vec<TierSymbol> = batch
            .iter()
            .map(|idx| pending[*idx].symbol.clone())
            .collect();
        let deadline = budget.tier_deadline(tier.timeout());

        let mut results = match timeout_at(deadline, tier.attempt_batch(&symbols, deadline)).await {
            Ok(results) => results,
            Err(_) => Vec::new(),
        };
        if results.len() != symbols.len() {
            if !results.is_empty() {
                warn!(
                    "Tier {} returned {} results for {} symbols",
                    id,
                    results.len(),
                    symbols.len()
                );
            }
            results = vec![
                Err(MarketDataError::Timeout {
                    provider: id.to_string(),
                });
                symbols.len()
            ];
        }

        for (idx, result) in batch.into_iter().zip(results) {
            let p = &mut pending[idx];
            match result {
                Ok(quote) => {
                    self.cache.put(&p.symbol.normalized.cache_key(), &quote);
                    p.diagnostics.record_success(id);
                    p.live = Some(quote);
                }
                Err(e) => {
                    p.diagnostics.record_error(id, e.to_string());
                    match e.retry_class() {
                        RetryClass::SkipToCache => p.not_found = true,
                        RetryClass::NextTierAndDisable => {
                            status.mark_unavailable(
                                id,
                                &p.symbol.normalized.exchange,
                                e.to_string(),
                            );
                        }
                        RetryClass::NextTier => {}
                    }
                }
            }
        }
    }

    fn finish(&self, p: &Pending) -> QuoteOutcome {
        if let Some(quote) = &p.live {
            return QuoteOutcome::Live(quote.clone());
        }
        if let Some(cached) = self
            .cache
            .get_stale(&p.symbol.normalized.cache_key(), &p.symbol.requested)
        {
            return QuoteOutcome::Cached(cached);
        }
        if p.not_found {
            QuoteOutcome::SymbolNotFound
        } else {
            QuoteOutcome::NoData
        }
    }
}

fn outcome_label(outcome: &QuoteOutcome) -> &'static str {
    match outcome {
        QuoteOutcome::Live(_) => "live",
        QuoteOutcome::Cached(_) => "cached",
        QuoteOutcome::NoData => "no data",
        QuoteOutcome::SymbolNotFound => "not found",
    }
}
