//! SQLite storage implementation for portfolio snapshots.

mod model;
mod repository;

pub use model::PortfolioSnapshotDB;
pub use repository::SqliteSnapshotRepository;

// Re-export trait from core for convenience
pub use tradedesk_core::portfolio::snapshot::SnapshotRepositoryTrait;
