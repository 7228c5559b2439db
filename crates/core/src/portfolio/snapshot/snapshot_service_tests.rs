#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tradedesk_market_data::{Quote, QuoteOutcome, Symbol};

    use crate::errors::Error;
    use crate::portfolio::holdings::Position;
    use crate::portfolio::snapshot::{
        assign_identity, InMemorySnapshotRepository, PortfolioSnapshot, SnapshotId,
        SnapshotIdentity, SnapshotRepositoryTrait, SnapshotService, SnapshotServiceTrait,
    };
    use crate::quotes::QuoteServiceTrait;

    struct FixedQuoteService {
        outcomes: HashMap<Symbol, QuoteOutcome>,
        calls: AtomicUsize,
    }

    impl FixedQuoteService {
        fn new() -> Self {
            Self {
                outcomes: HashMap::new(),
                calls: AtomicUsize::new(0),
            }
        }

        fn with(mut self, symbol: &str, price: Decimal, stale: bool) -> Self {
            let quote = Quote {
                symbol: Symbol::from(symbol),
                last_price: price,
                change: Decimal::ZERO,
                change_percent: Decimal::ZERO,
                volume: None,
                timestamp: Utc::now(),
                source: "YAHOO".to_string(),
                stale,
            };
            let outcome = if stale {
                QuoteOutcome::Cached(quote)
            } else {
                QuoteOutcome::Live(quote)
            };
            self.outcomes.insert(Symbol::from(symbol), outcome);
            self
        }
    }

    #[async_trait]
    impl QuoteServiceTrait for FixedQuoteService {
        async fn get_quote(&self, symbol: &Symbol) -> QuoteOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .get(symbol)
                .cloned()
                .unwrap_or(QuoteOutcome::NoData)
        }

        async fn get_quotes(&self, symbols: &[Symbol]) -> HashMap<Symbol, QuoteOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            symbols
                .iter()
                .map(|s| {
                    (
                        s.clone(),
                        self.outcomes.get(s).cloned().unwrap_or(QuoteOutcome::NoData),
                    )
                })
                .collect()
        }
    }

    fn setup(
        quotes: FixedQuoteService,
    ) -> (
        Arc<SnapshotService>,
        Arc<InMemorySnapshotRepository>,
        Arc<FixedQuoteService>,
    ) {
        let repo = Arc::new(InMemorySnapshotRepository::new());
        let quotes = Arc::new(quotes);
        let service = Arc::new(SnapshotService::new(repo.clone(), quotes.clone()));
        (service, repo, quotes)
    }

    // ==================== assign_identity ====================

    #[test]
    fn test_first_identity_uses_clock() {
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 10, 0, 0).unwrap();
        let identity = assign_identity(None, now);
        assert_eq!(identity.id.value(), now.timestamp_millis());
        assert_eq!(identity.timestamp, now);
    }

    #[test]
    fn test_identity_bumps_on_same_millisecond() {
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 10, 0, 0).unwrap();
        let last = assign_identity(None, now);

        let next = assign_identity(Some(&last), now);

        assert_eq!(next.id.value(), last.id.value() + 1);
        assert_eq!(next.timestamp, now);
    }

    #[test]
    fn test_identity_survives_clock_regression() {
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 10, 0, 0).unwrap();
        let last = SnapshotIdentity {
            id: SnapshotId::new(now.timestamp_millis()),
            timestamp: now,
        };

        let next = assign_identity(Some(&last), now - Duration::seconds(30));

        assert!(next.id > last.id);
        assert_eq!(next.timestamp, now);
    }

    // ==================== record_snapshot ====================

    #[tokio::test]
    async fn test_record_snapshot_values_positions() {
        let (service, repo, _) = setup(FixedQuoteService::new().with("TCS", dec!(110), false));
        let positions = vec![Position::new("TCS", dec!(10), dec!(100))];

        let id = service.record_snapshot(&positions, dec!(500)).await.unwrap();

        let snapshot = repo.get_latest_snapshot().unwrap().unwrap();
        assert_eq!(snapshot.id, id);
        assert_eq!(snapshot.cash_balance, dec!(500));
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.entries[0].mark_price, dec!(110));
        assert_eq!(snapshot.entries[0].unrealized_pnl, dec!(100));
        assert_eq!(snapshot.total_value, dec!(1600));
        assert!(!snapshot.has_stale_entries());
    }

    #[tokio::test]
    async fn test_stale_marks_are_kept_per_entry() {
        let (service, repo, _) = setup(
            FixedQuoteService::new()
                .with("TCS", dec!(110), false)
                .with("INFY", dec!(1500), true),
        );
        let positions = vec![
            Position::new("TCS", dec!(10), dec!(100)),
            Position::new("INFY", dec!(2), dec!(1400)),
            Position::new("GHOST", dec!(1), dec!(50)),
        ];

        service.record_snapshot(&positions, dec!(0)).await.unwrap();

        let snapshot = repo.get_latest_snapshot().unwrap().unwrap();
        let flags: Vec<(bool, bool)> = snapshot
            .entries
            .iter()
            .map(|e| (e.stale, e.mark_missing))
            .collect();
        assert_eq!(flags, vec![(false, false), (true, false), (true, true)]);
        assert_eq!(
            snapshot.stale_symbols(),
            vec![Symbol::from("INFY"), Symbol::from("GHOST")]
        );
    }

    #[tokio::test]
    async fn test_repeated_records_always_append() {
        let (service, repo, _) = setup(FixedQuoteService::new().with("TCS", dec!(110), false));
        let positions = vec![Position::new("TCS", dec!(1), dec!(100))];

        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(service.record_snapshot(&positions, dec!(0)).await.unwrap());
        }

        assert_eq!(repo.count_snapshots().unwrap(), 3);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));

        let all = service.snapshots_on_or_before(Utc::now()).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_records_get_distinct_ordered_ids() {
        let (service, repo, _) = setup(FixedQuoteService::new().with("TCS", dec!(110), false));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                let positions = vec![Position::new("TCS", dec!(1), dec!(100))];
                service.record_snapshot(&positions, dec!(0)).await
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap().unwrap());
        }

        assert_eq!(ids.len(), 20);
        let log = repo.get_snapshots_on_or_before(Utc::now() + Duration::days(1)).unwrap();
        assert_eq!(log.len(), 20);
        assert!(log.windows(2).all(|w| w[0].id < w[1].id));
        assert!(log.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn test_ids_continue_after_existing_history() {
        let (service, repo, _) = setup(FixedQuoteService::new());
        let future = Utc::now() + Duration::hours(1);
        let existing = PortfolioSnapshot::new(
            SnapshotId::new(future.timestamp_millis()),
            future,
            dec!(100),
            Vec::new(),
        );
        repo.append_snapshot(existing.clone()).await.unwrap();

        let id = service.record_snapshot(&[], dec!(100)).await.unwrap();

        assert_eq!(id.value(), existing.id.value() + 1);
        let latest = service.latest_snapshot().unwrap().unwrap();
        assert_eq!(latest.timestamp, future);
    }

    #[tokio::test]
    async fn test_invalid_positions_are_rejected_before_quoting() {
        let (service, repo, quotes) = setup(FixedQuoteService::new());
        let positions = vec![Position::new("TCS", dec!(-5), dec!(100))];

        let result = service.record_snapshot(&positions, dec!(0)).await;

        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(quotes.calls.load(Ordering::SeqCst), 0);
        assert_eq!(repo.count_snapshots().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_latest_snapshot_before_is_strict() {
        let (service, repo, _) = setup(FixedQuoteService::new());
        let t0 = Utc.with_ymd_and_hms(2026, 10, 14, 9, 0, 0).unwrap();
        for (i, hours) in [0i64, 24].iter().enumerate() {
            let at = t0 + Duration::hours(*hours);
            repo.append_snapshot(PortfolioSnapshot::new(
                SnapshotId::new(i as i64 + 1),
                at,
                dec!(1000),
                Vec::new(),
            ))
            .await
            .unwrap();
        }

        let day_two = t0 + Duration::hours(24);
        let prev = service.latest_snapshot_before(day_two).unwrap().unwrap();
        assert_eq!(prev.id, SnapshotId::new(1));
        assert!(service.latest_snapshot_before(t0).unwrap().is_none());
    }
}
