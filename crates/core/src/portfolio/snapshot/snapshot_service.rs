use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{PortfolioSnapshot, SnapshotId, SnapshotRepositoryTrait, SnapshotServiceTrait};
use crate::errors::Result;
use crate::portfolio::holdings::{unique_symbols, Position};
use crate::portfolio::valuation::value_positions;
use crate::quotes::QuoteServiceTrait;

/// Id and timestamp of a recorded snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnapshotIdentity {
    pub id: SnapshotId,
    pub timestamp: DateTime<Utc>,
}

/// Picks the identity of the next snapshot.
///
/// The id is the recording time in epoch milliseconds, bumped past the last
/// id on collision or clock regression. The timestamp never goes backwards.
pub fn assign_identity(last: Option<&SnapshotIdentity>, now: DateTime<Utc>) -> SnapshotIdentity {
    let now_ms = now.timestamp_millis();
    match last {
        None => SnapshotIdentity {
            id: SnapshotId::new(now_ms),
            timestamp: now,
        },
        Some(last) => SnapshotIdentity {
            id: SnapshotId::new(now_ms.max(last.id.value() + 1)),
            timestamp: now.max(last.timestamp),
        },
    }
}

#[derive(Default)]
struct AppendState {
    loaded: bool,
    last: Option<SnapshotIdentity>,
}

/// Records as-observed portfolio valuations into an append-only repository.
pub struct SnapshotService {
    repository: Arc<dyn SnapshotRepositoryTrait>,
    quote_service: Arc<dyn QuoteServiceTrait>,
    append_state: Mutex<AppendState>,
}

impl SnapshotService {
    pub fn new(
        repository: Arc<dyn SnapshotRepositoryTrait>,
        quote_service: Arc<dyn QuoteServiceTrait>,
    ) -> Self {
        Self {
            repository,
            quote_service,
            append_state: Mutex::new(AppendState::default()),
        }
    }
}

#[async_trait]
impl SnapshotServiceTrait for SnapshotService {
    async fn record_snapshot(
        &self,
        positions: &[Position],
        cash_balance: Decimal,
    ) -> Result<SnapshotId> {
        for position in positions {
            position.validate()?;
        }

        // Marks are fetched outside the append lock.
        let symbols = unique_symbols(positions);
        let quotes = self.quote_service.get_quotes(&symbols).await;
        let entries = value_positions(positions, &quotes);

        let mut state = self.append_state.lock().await;
        if !state.loaded {
            state.last = self
                .repository
                .get_latest_snapshot()?
                .map(|s| SnapshotIdentity {
                    id: s.id,
                    timestamp: s.timestamp,
                });
            state.loaded = true;
        }

        let identity = assign_identity(state.last.as_ref(), Utc::now());
        let snapshot =
            PortfolioSnapshot::new(identity.id, identity.timestamp, cash_balance, entries);

        let stale = snapshot.stale_symbols();
        let total_value = snapshot.total_value;
        self.repository.append_snapshot(snapshot).await?;
        state.last = Some(identity);
        drop(state);

        if stale.is_empty() {
            info!(
                "Recorded portfolio snapshot {} ({} positions, total {})",
                identity.id,
                positions.len(),
                total_value
            );
        } else {
            warn!(
                "Recorded portfolio snapshot {} with stale marks for {:?}",
                identity.id,
                stale.iter().map(|s| s.as_str()).collect::<Vec<_>>()
            );
        }

        Ok(identity.id)
    }

    fn latest_snapshot(&self) -> Result<Option<Arc<PortfolioSnapshot>>> {
        self.repository.get_latest_snapshot()
    }

    fn snapshots_on_or_before(&self, at: DateTime<Utc>) -> Result<Vec<Arc<PortfolioSnapshot>>> {
        let snapshots = self.repository.get_snapshots_on_or_before(at)?;
        debug!("{} snapshots on or before {}", snapshots.len(), at);
        Ok(snapshots)
    }

    fn latest_snapshot_before(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Option<Arc<PortfolioSnapshot>>> {
        self.repository.get_latest_snapshot_before(before)
    }
}
