//! Quote access for the portfolio services.
//!
//! ```text
//! PortfolioSummaryService / SnapshotService
//!        ↓
//! QuoteServiceTrait ── QuoteService → MarketDataAggregator (market-data crate)
//! ```

pub mod service;


pub use service::{QuoteService, QuoteServiceTrait};
