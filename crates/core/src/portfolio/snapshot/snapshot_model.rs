use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use tradedesk_market_data::Symbol;

/// Snapshot identifier.
///
/// Derived from the recording time in epoch milliseconds and strictly
/// increasing across appends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(i64);

impl SnapshotId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One valued position inside a snapshot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub symbol: Symbol,
    pub quantity: Decimal,
    pub average_cost: Decimal,
    pub mark_price: Decimal,
    /// quantity × mark price
    pub value: Decimal,
    /// (mark price − average cost) × quantity
    pub unrealized_pnl: Decimal,
    /// Mark did not come from a live provider round-trip.
    pub stale: bool,
    /// No quote at all was available; marked at average cost.
    #[serde(default)]
    pub mark_missing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark_source: Option<String>,
}

impl SnapshotEntry {
    pub fn cost_basis(&self) -> Decimal {
        self.average_cost * self.quantity
    }
}

/// Immutable, as-observed valuation of the whole portfolio.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub id: SnapshotId,
    pub timestamp: DateTime<Utc>,
    pub cash_balance: Decimal,
    pub entries: Vec<SnapshotEntry>,
    pub total_value: Decimal,
}

impl PortfolioSnapshot {
    /// Builds a snapshot; the total is cash plus the value of every entry.
    pub fn new(
        id: SnapshotId,
        timestamp: DateTime<Utc>,
        cash_balance: Decimal,
        entries: Vec<SnapshotEntry>,
    ) -> Self {
        let total_value = cash_balance + entries.iter().map(|e| e.value).sum::<Decimal>();
        Self {
            id,
            timestamp,
            cash_balance,
            entries,
            total_value,
        }
    }

    pub fn positions_value(&self) -> Decimal {
        self.entries.iter().map(|e| e.value).sum()
    }

    pub fn cost_basis(&self) -> Decimal {
        self.entries.iter().map(SnapshotEntry::cost_basis).sum()
    }

    pub fn has_stale_entries(&self) -> bool {
        self.entries.iter().any(|e| e.stale)
    }

    pub fn stale_symbols(&self) -> Vec<Symbol> {
        self.entries
            .iter()
            .filter(|e| e.stale)
            .map(|e| e.symbol.clone())
            .collect()
    }
}
