//! Tradedesk Core - portfolio snapshots, P&L and quote services.
//!
//! This crate contains the portfolio business logic. It is database-agnostic
//! and defines traits that are implemented by the `storage-sqlite` crate;
//! quotes come from the `market-data` crate through [`quotes::QuoteServiceTrait`].

pub mod constants;
pub mod errors;
pub mod portfolio;
pub mod quotes;

// Re-export common types from the portfolio module
pub use portfolio::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
