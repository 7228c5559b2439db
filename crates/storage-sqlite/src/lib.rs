//! SQLite storage implementation for Tradedesk.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `tradedesk-core` and contains:
//! - Database connection pooling and management
//! - Embedded Diesel migrations
//! - A single writer actor that serializes appends
//! - The append-only portfolio snapshot repository
//!
//! # Architecture
//!
//! This crate is the only place in the workspace where Diesel dependencies exist.
//!
//! ```text
//! core (domain, SnapshotRepositoryTrait)
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod portfolio;
pub mod schema;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors
pub use errors::StorageError;

pub use portfolio::snapshot::SqliteSnapshotRepository;

// Re-export from tradedesk-core for convenience
pub use tradedesk_core::errors::{DatabaseError, Error, Result};
