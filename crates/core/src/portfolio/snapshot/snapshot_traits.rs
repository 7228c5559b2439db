//! Repository and service traits for portfolio snapshots.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::{PortfolioSnapshot, SnapshotId};
use crate::errors::Result;
use crate::portfolio::holdings::Position;

/// Append-only store for portfolio snapshots.
///
/// Snapshots are never updated or overwritten once appended. Reads hand out
/// shared immutable values.
#[async_trait]
pub trait SnapshotRepositoryTrait: Send + Sync {
    /// Append a snapshot. Fails if a snapshot with the same id exists.
    async fn append_snapshot(&self, snapshot: PortfolioSnapshot) -> Result<()>;

    /// The most recently appended snapshot.
    fn get_latest_snapshot(&self) -> Result<Option<Arc<PortfolioSnapshot>>>;

    /// All snapshots with `timestamp <= at`, oldest first.
    fn get_snapshots_on_or_before(&self, at: DateTime<Utc>)
        -> Result<Vec<Arc<PortfolioSnapshot>>>;

    /// The latest snapshot with `timestamp < before`.
    fn get_latest_snapshot_before(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Option<Arc<PortfolioSnapshot>>>;

    fn count_snapshots(&self) -> Result<usize>;
}

#[async_trait]
pub trait SnapshotServiceTrait: Send + Sync {
    /// Values the positions at current marks and appends the result.
    async fn record_snapshot(&self, positions: &[Position], cash_balance: Decimal)
        -> Result<SnapshotId>;

    fn latest_snapshot(&self) -> Result<Option<Arc<PortfolioSnapshot>>>;

    fn snapshots_on_or_before(&self, at: DateTime<Utc>) -> Result<Vec<Arc<PortfolioSnapshot>>>;

    fn latest_snapshot_before(&self, before: DateTime<Utc>)
        -> Result<Option<Arc<PortfolioSnapshot>>>;
}
