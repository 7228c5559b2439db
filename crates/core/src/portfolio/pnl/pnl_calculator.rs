use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use log::debug;
use rust_decimal::Decimal;

use super::{DayPnl, OverallPnl, PnlConfidence, PnlConfig};
use crate::constants::DECIMAL_PRECISION;
use crate::errors::Result;
use crate::portfolio::snapshot::{PortfolioSnapshot, SnapshotEntry};

/// Pure P&L arithmetic over snapshot entries and snapshot pairs.
#[derive(Debug, Clone, Copy)]
pub struct PnlCalculator {
    timezone: Tz,
}

impl PnlCalculator {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn from_config(config: &PnlConfig) -> Result<Self> {
        Ok(Self::new(config.timezone()?))
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Σ(mark − average cost) × quantity, as a percentage of Σ(average cost × quantity).
    pub fn overall_pnl(&self, entries: &[SnapshotEntry]) -> OverallPnl {
        let amount: Decimal = entries.iter().map(|e| e.unrealized_pnl).sum();
        let cost_basis: Decimal = entries.iter().map(SnapshotEntry::cost_basis).sum();
        let market_value: Decimal = entries.iter().map(|e| e.value).sum();

        OverallPnl {
            amount: amount.round_dp(DECIMAL_PRECISION),
            percent: percent_of(amount, cost_basis),
            cost_basis: cost_basis.round_dp(DECIMAL_PRECISION),
            market_value: market_value.round_dp(DECIMAL_PRECISION),
        }
    }

    /// Start of the trading day containing `at`: local midnight in the
    /// market timezone.
    pub fn trading_day_start(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        let local_date = at.with_timezone(&self.timezone).date_naive();
        local_date
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| self.timezone.from_local_datetime(&midnight).earliest())
            .map(|start| start.with_timezone(&Utc))
            .unwrap_or(at)
    }

    /// Day P&L between `previous` and `current`.
    ///
    /// `previous` only qualifies when it lies strictly before the trading
    /// day that contains `current`; otherwise the result is
    /// [`PnlConfidence::Insufficient`] with a zero amount.
    pub fn day_pnl(
        &self,
        previous: Option<&PortfolioSnapshot>,
        current: Option<&PortfolioSnapshot>,
    ) -> DayPnl {
        let Some(current) = current else {
            return DayPnl::insufficient(None);
        };
        let Some(previous) = previous else {
            return DayPnl::insufficient(Some(current.id));
        };

        let day_start = self.trading_day_start(current.timestamp);
        if previous.id == current.id || previous.timestamp >= day_start {
            debug!(
                "Snapshot {} is not before the trading day starting {}",
                previous.id, day_start
            );
            return DayPnl::insufficient(Some(current.id));
        }

        let amount = current.total_value - previous.total_value;
        let confidence = if previous.has_stale_entries() || current.has_stale_entries() {
            PnlConfidence::Degraded
        } else {
            PnlConfidence::Full
        };

        DayPnl {
            amount: amount.round_dp(DECIMAL_PRECISION),
            percent: percent_of(amount, previous.total_value),
            confidence,
            previous_snapshot_id: Some(previous.id),
            current_snapshot_id: Some(current.id),
        }
    }
}

fn percent_of(amount: Decimal, base: Decimal) -> Decimal {
    if base.is_zero() {
        return Decimal::ZERO;
    }
    (amount / base * Decimal::ONE_HUNDRED).round_dp(DECIMAL_PRECISION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::snapshot::SnapshotId;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use tradedesk_market_data::Symbol;

    fn calculator() -> PnlCalculator {
        PnlCalculator::from_config(&PnlConfig::default()).unwrap()
    }

    fn entry(symbol: &str, qty: Decimal, cost: Decimal, mark: Decimal, stale: bool) -> SnapshotEntry {
        SnapshotEntry {
            symbol: Symbol::from(symbol),
            quantity: qty,
            average_cost: cost,
            mark_price: mark,
            value: qty * mark,
            unrealized_pnl: (mark - cost) * qty,
            stale,
            mark_missing: false,
            mark_source: Some("BROKER".to_string()),
        }
    }

    fn snapshot(id: i64, at: DateTime<Utc>, cash: Decimal, stale: bool) -> PortfolioSnapshot {
        PortfolioSnapshot::new(
            SnapshotId::new(id),
            at,
            cash,
            vec![entry("TCS", dec!(1), dec!(100), dec!(100), stale)],
        )
    }

    #[test]
    fn test_overall_pnl_single_position() {
        let entries = vec![entry("TCS", dec!(10), dec!(100), dec!(110), false)];

        let pnl = calculator().overall_pnl(&entries);

        assert_eq!(pnl.amount, dec!(100));
        assert_eq!(pnl.percent, dec!(10));
        assert_eq!(pnl.cost_basis, dec!(1000));
        assert_eq!(pnl.market_value, dec!(1100));
    }

    #[test]
    fn test_overall_pnl_without_positions_is_zero() {
        let pnl = calculator().overall_pnl(&[]);
        assert_eq!(pnl.amount, Decimal::ZERO);
        assert_eq!(pnl.percent, Decimal::ZERO);
    }

    #[test]
    fn test_trading_day_start_uses_market_timezone() {
        // 2026-10-15 20:00 UTC is 2026-10-16 01:30 in Asia/Kolkata.
        let at = Utc.with_ymd_and_hms(2026, 10, 15, 20, 0, 0).unwrap();
        let start = calculator().trading_day_start(at);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 10, 15, 18, 30, 0).unwrap());
    }

    #[test]
    fn test_day_pnl_with_single_snapshot_is_insufficient() {
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 6, 0, 0).unwrap();
        let only = snapshot(1, now, dec!(100000), false);

        let pnl = calculator().day_pnl(None, Some(&only));

        assert_eq!(pnl.confidence, PnlConfidence::Insufficient);
        assert_eq!(pnl.amount, Decimal::ZERO);
        assert_eq!(pnl.current_snapshot_id, Some(SnapshotId::new(1)));
        assert!(calculator().day_pnl(None, None).is_insufficient());
    }

    #[test]
    fn test_day_pnl_across_day_boundary() {
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 6, 0, 0).unwrap();
        let prev = snapshot(1, now - Duration::days(1), dec!(99900), false);
        let cur = snapshot(2, now, dec!(101150), false);
        assert_eq!(prev.total_value, dec!(100000));
        assert_eq!(cur.total_value, dec!(101250));

        let pnl = calculator().day_pnl(Some(&prev), Some(&cur));

        assert_eq!(pnl.amount, dec!(1250));
        assert_eq!(pnl.percent, dec!(1.25));
        assert_eq!(pnl.confidence, PnlConfidence::Full);
        assert_eq!(pnl.previous_snapshot_id, Some(SnapshotId::new(1)));
    }

    #[test]
    fn test_day_pnl_with_stale_entry_is_degraded() {
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 6, 0, 0).unwrap();
        let prev = snapshot(1, now - Duration::days(1), dec!(99900), true);
        let cur = snapshot(2, now, dec!(101150), false);

        let pnl = calculator().day_pnl(Some(&prev), Some(&cur));

        assert_eq!(pnl.amount, dec!(1250));
        assert_eq!(pnl.percent, dec!(1.25));
        assert_eq!(pnl.confidence, PnlConfidence::Degraded);
    }

    #[test]
    fn test_day_pnl_same_day_snapshots_do_not_qualify() {
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 9, 0, 0).unwrap();
        let earlier_today = snapshot(1, now - Duration::hours(2), dec!(99900), false);
        let cur = snapshot(2, now, dec!(101150), false);

        let pnl = calculator().day_pnl(Some(&earlier_today), Some(&cur));

        assert!(pnl.is_insufficient());
        assert_eq!(pnl.amount, Decimal::ZERO);
    }

    #[test]
    fn test_unknown_timezone_is_a_config_error() {
        let config = PnlConfig {
            market_timezone: "Mars/Olympus".to_string(),
        };
        assert!(matches!(
            PnlCalculator::from_config(&config),
            Err(crate::errors::Error::InvalidConfigValue(_))
        ));
    }
}
