//! Database model for portfolio snapshots.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::StorageError;
use tradedesk_core::portfolio::snapshot::{PortfolioSnapshot, SnapshotEntry, SnapshotId};
use tradedesk_market_data::Symbol;

/// Fixed-width UTC format; lexicographic order equals time order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9fZ";

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            StorageError::SerializationError(format!("Invalid timestamp '{}': {}", value, e))
        })
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(value).map_err(|e| {
        StorageError::SerializationError(format!("Invalid {} '{}': {}", field, value, e))
    })
}

/// Database row for a portfolio snapshot.
///
/// Money is stored as decimal strings and entries as a JSON array, so no
/// value passes through a float on its way to disk.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::portfolio_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PortfolioSnapshotDB {
    pub id: i64,
    pub recorded_at: String,
    pub cash_balance: String,
    pub total_value: String,
    pub entries: String,
    pub has_stale_entries: bool,
}

/// JSON form of one snapshot entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotEntryRecord {
    symbol: String,
    quantity: String,
    average_cost: String,
    mark_price: String,
    value: String,
    unrealized_pnl: String,
    stale: bool,
    #[serde(default)]
    mark_missing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mark_source: Option<String>,
}

impl From<&SnapshotEntry> for SnapshotEntryRecord {
    fn from(entry: &SnapshotEntry) -> Self {
        Self {
            symbol: entry.symbol.to_string(),
            quantity: entry.quantity.to_string(),
            average_cost: entry.average_cost.to_string(),
            mark_price: entry.mark_price.to_string(),
            value: entry.value.to_string(),
            unrealized_pnl: entry.unrealized_pnl.to_string(),
            stale: entry.stale,
            mark_missing: entry.mark_missing,
            mark_source: entry.mark_source.clone(),
        }
    }
}

impl TryFrom<SnapshotEntryRecord> for SnapshotEntry {
    type Error = StorageError;

    fn try_from(record: SnapshotEntryRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            symbol: Symbol::new(&record.symbol),
            quantity: parse_decimal("quantity", &record.quantity)?,
            average_cost: parse_decimal("averageCost", &record.average_cost)?,
            mark_price: parse_decimal("markPrice", &record.mark_price)?,
            value: parse_decimal("value", &record.value)?,
            unrealized_pnl: parse_decimal("unrealizedPnl", &record.unrealized_pnl)?,
            stale: record.stale,
            mark_missing: record.mark_missing,
            mark_source: record.mark_source,
        })
    }
}

// Conversion from Domain model to DB model
impl TryFrom<&PortfolioSnapshot> for PortfolioSnapshotDB {
    type Error = StorageError;

    fn try_from(snapshot: &PortfolioSnapshot) -> Result<Self, Self::Error> {
        let records: Vec<SnapshotEntryRecord> =
            snapshot.entries.iter().map(SnapshotEntryRecord::from).collect();

        Ok(Self {
            id: snapshot.id.value(),
            recorded_at: format_timestamp(snapshot.timestamp),
            cash_balance: snapshot.cash_balance.to_string(),
            total_value: snapshot.total_value.to_string(),
            entries: serde_json::to_string(&records)?,
            has_stale_entries: snapshot.has_stale_entries(),
        })
    }
}

// Conversion from DB model to Domain model
impl TryFrom<PortfolioSnapshotDB> for PortfolioSnapshot {
    type Error = StorageError;

    fn try_from(db: PortfolioSnapshotDB) -> Result<Self, Self::Error> {
        let records: Vec<SnapshotEntryRecord> = serde_json::from_str(&db.entries)?;
        let entries = records
            .into_iter()
            .map(SnapshotEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: SnapshotId::new(db.id),
            timestamp: parse_timestamp(&db.recorded_at)?,
            cash_balance: parse_decimal("cashBalance", &db.cash_balance)?,
            entries,
            total_value: parse_decimal("totalValue", &db.total_value)?,
        })
    }
}
