use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MARKET_TIMEZONE;
use crate::errors::{Error, Result};
use crate::portfolio::snapshot::SnapshotId;

/// How far a day P&L figure can be trusted.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PnlConfidence {
    /// Both snapshots were marked entirely from live quotes.
    Full,
    /// At least one entry in either snapshot carried a stale mark.
    Degraded,
    /// No snapshot before the trading-day boundary; the amount is zero.
    Insufficient,
}

/// Unrealized P&L of the current positions against their cost basis.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverallPnl {
    pub amount: Decimal,
    pub percent: Decimal,
    pub cost_basis: Decimal,
    pub market_value: Decimal,
}

/// Valuation change between the last snapshot of the previous trading day
/// and the latest snapshot.
///
/// Cash deposits and withdrawals between the two snapshots are not netted
/// out; the amount is a pure valuation delta.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayPnl {
    pub amount: Decimal,
    pub percent: Decimal,
    pub confidence: PnlConfidence,
    pub previous_snapshot_id: Option<SnapshotId>,
    pub current_snapshot_id: Option<SnapshotId>,
}

impl DayPnl {
    /// Zero with an explicit insufficient-history marker.
    pub fn insufficient(current_snapshot_id: Option<SnapshotId>) -> Self {
        Self {
            amount: Decimal::ZERO,
            percent: Decimal::ZERO,
            confidence: PnlConfidence::Insufficient,
            previous_snapshot_id: None,
            current_snapshot_id,
        }
    }

    pub fn is_insufficient(&self) -> bool {
        self.confidence == PnlConfidence::Insufficient
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PnlConfig {
    /// IANA zone whose local midnight starts a trading day.
    #[serde(default = "default_market_timezone")]
    pub market_timezone: String,
}

fn default_market_timezone() -> String {
    DEFAULT_MARKET_TIMEZONE.to_string()
}

impl Default for PnlConfig {
    fn default() -> Self {
        Self {
            market_timezone: default_market_timezone(),
        }
    }
}

impl PnlConfig {
    pub fn timezone(&self) -> Result<Tz> {
        self.market_timezone.parse::<Tz>().map_err(|_| {
            Error::InvalidConfigValue(format!(
                "Unknown market timezone '{}'",
                self.market_timezone
            ))
        })
    }
}
