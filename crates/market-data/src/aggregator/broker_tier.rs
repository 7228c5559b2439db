//! Tier A: authenticated live broker feed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::time::Instant;

use super::budget::with_deadline;
use super::diagnostics::SkipReason;
use super::tier::{QuoteTier, TierSymbol};
use crate::errors::MarketDataError;
use crate::models::{InstrumentKey, Quote};
use crate::provider::BrokerSession;
use crate::resolver::InstrumentResolver;

/// Resolves symbols to broker instrument keys and fetches them in one
/// batched call.
pub struct BrokerTier {
    session: Arc<dyn BrokerSession>,
    resolver: Arc<InstrumentResolver>,
    timeout: Duration,
}

impl BrokerTier {
    pub fn new(
        session: Arc<dyn BrokerSession>,
        resolver: Arc<InstrumentResolver>,
        timeout: Duration,
    ) -> Self {
        Self {
            session,
            resolver,
            timeout,
        }
    }
}

#[async_trait]
impl QuoteTier for BrokerTier {
    fn id(&self) -> &str {
        self.session.id()
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn is_ready(&self) -> Result<(), SkipReason> {
        if self.session.is_connected() {
            Ok(())
        } else {
            Err(SkipReason::NotConnected)
        }
    }

    async fn attempt_batch(
        &self,
        symbols: &[TierSymbol],
        deadline: Instant,
    ) -> Vec<Result<Quote, MarketDataError>> {
        let provider = self.session.id();
        let mut results: Vec<Option<Result<Quote, MarketDataError>>> = vec![None; symbols.len()];
        let mut keyed: Vec<(usize, InstrumentKey)> = Vec::with_capacity(symbols.len());

        // A pending bulk download is never waited on here.
        for (idx, symbol) in symbols.iter().enumerate() {
            match self.resolver.resolve_without_waiting(&symbol.normalized) {
                Ok(resolved) => keyed.push((idx, resolved.key)),
                Err(e) => results[idx] = Some(Err(e)),
            }
        }

        if !keyed.is_empty() {
            let mut keys: Vec<InstrumentKey> = Vec::with_capacity(keyed.len());
            for (_, key) in &keyed {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
            debug!("Fetching {} quotes from {}", keys.len(), provider);

            match with_deadline(provider, deadline, self.session.fetch_quotes(&keys)).await {
                Ok(quotes) => {
                    for (idx, key) in keyed {
                        results[idx] = Some(match quotes.get(key.as_str()).cloned() {
                            Some(raw) => Ok(Quote::from_provider(
                                symbols[idx].requested.clone(),
                                raw,
                                provider,
                            )),
                            None => Err(MarketDataError::ProviderError {
                                provider: provider.to_string(),
                                message: format!("No quote returned for {}", key),
                            }),
                        });
                    }
                }
                Err(e) => {
                    for (idx, _) in keyed {
                        results[idx] = Some(Err(e.clone()));
                    }
                }
            }
        }

        results
            .into_iter()
            .map(|result| {
                result.unwrap_or_else(|| {
                    Err(MarketDataError::ProviderError {
                        provider: provider.to_string(),
                        message: "Symbol was not attempted".to_string(),
                    })
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{ProviderQuote, Symbol};
    use crate::resolver::{ProviderStatusTable, ResolverConfig};

    struct MockSession {
        connected: bool,
        calls: AtomicUsize,
        error: Option<MarketDataError>,
    }

    #[async_trait]
    impl BrokerSession for MockSession {
        fn id(&self) -> &'static str {
            "BROKER"
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        async fn fetch_quotes(
            &self,
            keys: &[InstrumentKey],
        ) -> Result<HashMap<String, ProviderQuote>, MarketDataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(error) = &self.error {
                return Err(error.clone());
            }
            Ok(keys
                .iter()
                .filter(|key| key.as_str() != "NSE_INDEX|India VIX")
                .map(|key| {
                    (
                        key.as_str().to_string(),
                        ProviderQuote {
                            last_price: dec!(100),
                            previous_close: Some(dec!(80)),
                            ..Default::default()
                        },
                    )
                })
                .collect())
        }
    }

    fn tier(session: MockSession) -> (BrokerTier, Arc<MockSession>) {
        let session = Arc::new(session);
        let resolver = Arc::new(InstrumentResolver::new(
            ResolverConfig::default(),
            Arc::new(ProviderStatusTable::new()),
        ));
        (
            BrokerTier::new(session.clone(), resolver, Duration::from_secs(10)),
            session,
        )
    }

    fn tier_symbol(raw: &str) -> TierSymbol {
        let requested = Symbol::from(raw);
        let normalized =
            crate::resolver::normalize_symbol(requested.as_str(), None, crate::models::NSE);
        TierSymbol {
            requested,
            normalized,
        }
    }

    fn deadline() -> Instant {
        Instant::now() + Duration::from_secs(10)
    }

    #[tokio::test]
    async fn test_batch_uses_one_round_trip() {
        let (tier, session) = tier(MockSession {
            connected: true,
            calls: AtomicUsize::new(0),
            error: None,
        });
        let symbols = vec![
            tier_symbol("NIFTY"),
            tier_symbol("BANKNIFTY"),
            tier_symbol("RELIANCE"),
            tier_symbol("INDIAVIX"),
        ];

        let results = tier.attempt_batch(&symbols, deadline()).await;

        assert_eq!(session.calls.load(Ordering::SeqCst), 1);
        let nifty = results[0].as_ref().unwrap();
        assert_eq!(nifty.symbol.as_str(), "NIFTY");
        assert_eq!(nifty.source, "BROKER");
        assert_eq!(nifty.change, dec!(20));
        assert_eq!(nifty.change_percent, dec!(25));
        assert!(!nifty.stale);
        assert!(results[1].is_ok());
        // No bulk file and not in the static table
        assert!(matches!(
            results[2],
            Err(MarketDataError::ResolutionFailed { .. })
        ));
        // Resolved but absent from the response
        assert!(matches!(
            results[3],
            Err(MarketDataError::ProviderError { .. })
        ));
    }

    #[tokio::test]
    async fn test_batch_error_applies_to_every_symbol() {
        let (tier, _) = tier(MockSession {
            connected: true,
            calls: AtomicUsize::new(0),
            error: Some(MarketDataError::Unauthorized {
                provider: "BROKER".to_string(),
                message: "token expired".to_string(),
            }),
        });

        let results = tier
            .attempt_batch(&[tier_symbol("NIFTY"), tier_symbol("SENSEX")], deadline())
            .await;

        assert!(results
            .iter()
            .all(|r| matches!(r, Err(MarketDataError::Unauthorized { .. }))));
    }

    #[test]
    fn test_not_ready_without_session() {
        let (tier, _) = tier(MockSession {
            connected: false,
            calls: AtomicUsize::new(0),
            error: None,
        });
        assert_eq!(tier.is_ready(), Err(SkipReason::NotConnected));
    }
}
