#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use chrono_tz::Asia::Kolkata;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::Arc;

    use tradedesk_market_data::{Quote, QuoteOutcome, Symbol};

    use crate::errors::{Error, Result};
    use crate::portfolio::holdings::{Holdings, HoldingsSourceTrait, Position};
    use crate::portfolio::pnl::{PnlCalculator, PnlConfidence};
    use crate::portfolio::snapshot::{
        InMemorySnapshotRepository, PortfolioSnapshot, SnapshotEntry, SnapshotId,
        SnapshotRepositoryTrait, SnapshotService,
    };
    use crate::portfolio::summary::{PortfolioSummaryService, PortfolioSummaryServiceTrait};
    use crate::quotes::QuoteServiceTrait;

    struct StaticHoldings(Option<Holdings>);

    #[async_trait]
    impl HoldingsSourceTrait for StaticHoldings {
        async fn get_holdings(&self) -> Result<Holdings> {
            self.0
                .clone()
                .ok_or_else(|| Error::Repository("holdings unavailable".to_string()))
        }
    }

    struct MapQuotes(HashMap<Symbol, QuoteOutcome>);

    impl MapQuotes {
        fn new(prices: &[(&str, Decimal, bool)]) -> Self {
            let mut outcomes = HashMap::new();
            for (symbol, price, stale) in prices {
                let quote = Quote {
                    symbol: Symbol::from(*symbol),
                    last_price: *price,
                    change: Decimal::ZERO,
                    change_percent: Decimal::ZERO,
                    volume: None,
                    timestamp: Utc::now(),
                    source: "BROKER".to_string(),
                    stale: *stale,
                };
                let outcome = if *stale {
                    QuoteOutcome::Cached(quote)
                } else {
                    QuoteOutcome::Live(quote)
                };
                outcomes.insert(Symbol::from(*symbol), outcome);
            }
            Self(outcomes)
        }
    }

    #[async_trait]
    impl QuoteServiceTrait for MapQuotes {
        async fn get_quote(&self, symbol: &Symbol) -> QuoteOutcome {
            self.0.get(symbol).cloned().unwrap_or(QuoteOutcome::NoData)
        }

        async fn get_quotes(&self, symbols: &[Symbol]) -> HashMap<Symbol, QuoteOutcome> {
            let mut result = HashMap::new();
            for symbol in symbols {
                result.insert(symbol.clone(), self.get_quote(symbol).await);
            }
            result
        }
    }

    fn build(
        holdings: Option<Holdings>,
        quotes: MapQuotes,
    ) -> (PortfolioSummaryService, Arc<InMemorySnapshotRepository>) {
        let repo = Arc::new(InMemorySnapshotRepository::new());
        let quotes: Arc<dyn QuoteServiceTrait> = Arc::new(quotes);
        let snapshots = Arc::new(SnapshotService::new(repo.clone(), quotes.clone()));
        let service = PortfolioSummaryService::new(
            Arc::new(StaticHoldings(holdings)),
            quotes,
            snapshots,
            PnlCalculator::new(Kolkata),
        );
        (service, repo)
    }

    fn history_snapshot(id: i64, at: DateTime<Utc>, total: Decimal, stale: bool) -> PortfolioSnapshot {
        let entry = SnapshotEntry {
            symbol: Symbol::from("TCS"),
            quantity: dec!(10),
            average_cost: dec!(100),
            mark_price: dec!(110),
            value: dec!(1100),
            unrealized_pnl: dec!(100),
            stale,
            mark_missing: false,
            mark_source: Some("BROKER".to_string()),
        };
        PortfolioSnapshot::new(SnapshotId::new(id), at, total - dec!(1100), vec![entry])
    }

    fn one_position() -> Holdings {
        Holdings::new(vec![Position::new("TCS", dec!(10), dec!(100))], dec!(500))
    }

    #[tokio::test]
    async fn test_summary_without_history() {
        let (service, _) = build(Some(one_position()), MapQuotes::new(&[("TCS", dec!(110), false)]));

        let summary = service.get_portfolio_summary().await.unwrap();

        assert_eq!(summary.positions_value, dec!(1100));
        assert_eq!(summary.total_value, dec!(1600));
        assert_eq!(summary.cash_balance, dec!(500));
        assert_eq!(summary.overall_pnl.amount, dec!(100));
        assert_eq!(summary.overall_pnl.percent, dec!(10));
        assert_eq!(summary.day_pnl.amount, Decimal::ZERO);
        assert_eq!(summary.confidence, PnlConfidence::Insufficient);
        assert!(summary.stale_symbols.is_empty());
    }

    #[tokio::test]
    async fn test_day_pnl_from_history() {
        let (service, repo) = build(Some(one_position()), MapQuotes::new(&[("TCS", dec!(110), false)]));
        let yesterday = Utc.with_ymd_and_hms(2026, 10, 14, 6, 0, 0).unwrap();
        let today = Utc.with_ymd_and_hms(2026, 10, 15, 6, 0, 0).unwrap();
        repo.append_snapshot(history_snapshot(1, yesterday, dec!(100000), false))
            .await
            .unwrap();
        repo.append_snapshot(history_snapshot(2, today, dec!(101250), false))
            .await
            .unwrap();

        let summary = service.get_portfolio_summary().await.unwrap();

        assert_eq!(summary.day_pnl.amount, dec!(1250));
        assert_eq!(summary.day_pnl.percent, dec!(1.25));
        assert_eq!(summary.confidence, PnlConfidence::Full);
        assert_eq!(summary.day_pnl.previous_snapshot_id, Some(SnapshotId::new(1)));
        assert_eq!(summary.day_pnl.current_snapshot_id, Some(SnapshotId::new(2)));
    }

    #[tokio::test]
    async fn test_stale_history_degrades_confidence() {
        let (service, repo) = build(Some(one_position()), MapQuotes::new(&[("TCS", dec!(110), false)]));
        let yesterday = Utc.with_ymd_and_hms(2026, 10, 14, 6, 0, 0).unwrap();
        let today = Utc.with_ymd_and_hms(2026, 10, 15, 6, 0, 0).unwrap();
        repo.append_snapshot(history_snapshot(1, yesterday, dec!(100000), false))
            .await
            .unwrap();
        repo.append_snapshot(history_snapshot(2, today, dec!(101250), true))
            .await
            .unwrap();

        let day = service.day_pnl().unwrap();

        assert_eq!(day.amount, dec!(1250));
        assert_eq!(day.confidence, PnlConfidence::Degraded);
    }

    #[tokio::test]
    async fn test_record_then_single_snapshot_is_insufficient() {
        let (service, repo) = build(Some(one_position()), MapQuotes::new(&[("TCS", dec!(110), false)]));

        let id = service.record_snapshot().await.unwrap();

        assert_eq!(repo.count_snapshots().unwrap(), 1);
        let day = service.day_pnl().unwrap();
        assert!(day.is_insufficient());
        assert_eq!(day.amount, Decimal::ZERO);
        assert_eq!(day.current_snapshot_id, Some(id));
    }

    #[tokio::test]
    async fn test_stale_and_missing_marks_are_listed() {
        let holdings = Holdings::new(
            vec![
                Position::new("TCS", dec!(10), dec!(100)),
                Position::new("INFY", dec!(2), dec!(1500)),
                Position::new("DELISTED", dec!(5), dec!(20)),
            ],
            dec!(0),
        );
        let (service, _) = build(
            Some(holdings),
            MapQuotes::new(&[("TCS", dec!(110), false), ("INFY", dec!(1450), true)]),
        );

        let summary = service.get_portfolio_summary().await.unwrap();

        assert_eq!(
            summary.stale_symbols,
            vec![Symbol::from("INFY"), Symbol::from("DELISTED")]
        );
        assert_eq!(summary.missing_symbols, vec![Symbol::from("DELISTED")]);
        // 100 gain on TCS, 100 loss on INFY, DELISTED at cost
        assert_eq!(summary.overall_pnl.amount, Decimal::ZERO);
        assert_eq!(summary.positions_value, dec!(1100) + dec!(2900) + dec!(100));
    }

    #[tokio::test]
    async fn test_holdings_failure_propagates() {
        let (service, repo) = build(None, MapQuotes::new(&[]));

        assert!(matches!(
            service.get_portfolio_summary().await,
            Err(Error::Repository(_))
        ));
        assert!(service.record_snapshot().await.is_err());
        assert_eq!(repo.count_snapshots().unwrap(), 0);
    }
}
