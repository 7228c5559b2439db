//! Portfolio snapshots - append-only as-observed valuations.

mod memory_repository;
mod snapshot_model;
pub mod snapshot_service;
mod snapshot_traits;

pub use memory_repository::InMemorySnapshotRepository;
pub use snapshot_model::*;
pub use snapshot_service::*;
pub use snapshot_traits::*;

#[cfg(test)]
pub mod snapshot_service_tests;
