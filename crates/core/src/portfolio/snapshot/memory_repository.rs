use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::warn;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{PortfolioSnapshot, SnapshotRepositoryTrait};
use crate::errors::{DatabaseError, Result};

/// Process-local append-only snapshot log.
///
/// Appends take the write lock for the push only; readers clone `Arc`s and
/// never see a snapshot change after it became visible.
#[derive(Default)]
pub struct InMemorySnapshotRepository {
    snapshots: RwLock<Vec<Arc<PortfolioSnapshot>>>,
}

impl InMemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<PortfolioSnapshot>>> {
        self.snapshots.read().unwrap_or_else(|poisoned| {
            warn!("Snapshot log lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Arc<PortfolioSnapshot>>> {
        self.snapshots.write().unwrap_or_else(|poisoned| {
            warn!("Snapshot log lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

#[async_trait]
impl SnapshotRepositoryTrait for InMemorySnapshotRepository {
    async fn append_snapshot(&self, snapshot: PortfolioSnapshot) -> Result<()> {
        let mut snapshots = self.write();

        if let Some(last) = snapshots.last() {
            if snapshot.id <= last.id {
                return Err(DatabaseError::UniqueViolation(format!(
                    "Snapshot id {} is not after the latest id {}",
                    snapshot.id, last.id
                ))
                .into());
            }
            if snapshot.timestamp < last.timestamp {
                return Err(DatabaseError::QueryFailed(format!(
                    "Snapshot {} is timestamped before snapshot {}",
                    snapshot.id, last.id
                ))
                .into());
            }
        }

        snapshots.push(Arc::new(snapshot));
        Ok(())
    }

    fn get_latest_snapshot(&self) -> Result<Option<Arc<PortfolioSnapshot>>> {
        Ok(self.read().last().cloned())
    }

    fn get_snapshots_on_or_before(
        &self,
        at: DateTime<Utc>,
    ) -> Result<Vec<Arc<PortfolioSnapshot>>> {
        Ok(self
            .read()
            .iter()
            .take_while(|s| s.timestamp <= at)
            .cloned()
            .collect())
    }

    fn get_latest_snapshot_before(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Option<Arc<PortfolioSnapshot>>> {
        Ok(self
            .read()
            .iter()
            .rev()
            .find(|s| s.timestamp < before)
            .cloned())
    }

    fn count_snapshots(&self) -> Result<usize> {
        Ok(self.read().len())
    }
}
