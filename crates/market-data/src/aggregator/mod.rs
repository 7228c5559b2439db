//! Tiered quote aggregation.
//!
//! ```text
//!  symbols ──► Tier A (broker) ──fail──► Tier B (delayed) ──fail──► cache ──► NoData
//!                  │                         │                        │
//!                  └── live ◄────────────────┘                 stale quote
//! ```
//!
//! Every tier runs under a deadline taken from one shared [`Budget`], so the
//! whole chain finishes within [`AggregatorConfig::overall_ceiling`].

mod broker_tier;
mod budget;
mod cache;
mod config;
mod delayed_tier;
mod diagnostics;
mod quote_aggregator;
mod tier;

pub use broker_tier::BrokerTier;
pub use budget::{with_deadline, Budget};
pub use cache::QuoteCache;
pub use config::AggregatorConfig;
pub use delayed_tier::DelayedTier;
pub use diagnostics::{FetchDiagnostics, SkipReason, TierAttempt};
pub use quote_aggregator::{MarketDataAggregator, QuoteReport};
pub use tier::{QuoteTier, TierSymbol};
