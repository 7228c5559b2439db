use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::debug;
use std::sync::Arc;

use super::model::{format_timestamp, PortfolioSnapshotDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use tradedesk_core::errors::{Error, Result};
use tradedesk_core::portfolio::snapshot::{PortfolioSnapshot, SnapshotRepositoryTrait};

/// Insert-only snapshot store.
///
/// Writes go through the single writer actor; reads use pooled connections.
/// The primary key on `id` rejects any attempt to overwrite a snapshot.
pub struct SqliteSnapshotRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SqliteSnapshotRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    fn to_domain(rows: Vec<PortfolioSnapshotDB>) -> Result<Vec<Arc<PortfolioSnapshot>>> {
        rows.into_iter()
            .map(|row| {
                PortfolioSnapshot::try_from(row)
                    .map(Arc::new)
                    .map_err(Error::from)
            })
            .collect()
    }
}

#[async_trait]
impl SnapshotRepositoryTrait for SqliteSnapshotRepository {
    async fn append_snapshot(&self, snapshot: PortfolioSnapshot) -> Result<()> {
        use crate::schema::portfolio_snapshots::dsl::*;

        let row = PortfolioSnapshotDB::try_from(&snapshot)?;
        debug!("Appending snapshot {} at {}", row.id, row.recorded_at);

        self.writer
            .exec(move |conn| {
                diesel::insert_into(portfolio_snapshots)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    fn get_latest_snapshot(&self) -> Result<Option<Arc<PortfolioSnapshot>>> {
        use crate::schema::portfolio_snapshots::dsl::*;
        let mut conn = get_connection(&self.pool)?;

        let row = portfolio_snapshots
            .select(PortfolioSnapshotDB::as_select())
            .order(id.desc())
            .first::<PortfolioSnapshotDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        Ok(Self::to_domain(row.into_iter().collect())?.pop())
    }

    fn get_snapshots_on_or_before(
        &self,
        at: DateTime<Utc>,
    ) -> Result<Vec<Arc<PortfolioSnapshot>>> {
        use crate::schema::portfolio_snapshots::dsl::*;
        let mut conn = get_connection(&self.pool)?;

        let rows = portfolio_snapshots
            .select(PortfolioSnapshotDB::as_select())
            .filter(recorded_at.le(format_timestamp(at)))
            .order((recorded_at.asc(), id.asc()))
            .load::<PortfolioSnapshotDB>(&mut conn)
            .map_err(StorageError::from)?;

        debug!("Loaded {} snapshots on or before {}", rows.len(), at);
        Self::to_domain(rows)
    }

    fn get_latest_snapshot_before(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Option<Arc<PortfolioSnapshot>>> {
        use crate::schema::portfolio_snapshots::dsl::*;
        let mut conn = get_connection(&self.pool)?;

        let row = portfolio_snapshots
            .select(PortfolioSnapshotDB::as_select())
            .filter(recorded_at.lt(format_timestamp(before)))
            .order((recorded_at.desc(), id.desc()))
            .first::<PortfolioSnapshotDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        Ok(Self::to_domain(row.into_iter().collect())?.pop())
    }

    fn count_snapshots(&self) -> Result<usize> {
        use crate::schema::portfolio_snapshots::dsl::*;
        let mut conn = get_connection(&self.pool)?;

        let count: i64 = portfolio_snapshots
            .count()
            .get_result(&mut conn)
            .map_err(StorageError::from)?;
        Ok(count.max(0) as usize)
    }
}
