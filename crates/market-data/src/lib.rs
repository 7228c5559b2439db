//! Tradedesk Market Data Crate
//!
//! Resolves user-entered ticker symbols to provider identifiers and fetches
//! quotes through a tiered fallback chain with a bounded worst-case latency.
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |   get_quote(s)   |  MarketDataAggregator
//! +------------------+
//!          |
//!          v
//! +------------------+     +----------------------+
//! |  normalize       | --> |  InstrumentResolver  |  bulk file, static aliases
//! +------------------+     +----------------------+
//!          |                          |
//!          v                          v
//! +------------------+     +----------------------+
//! |  Tier A (broker) | --> |  Tier B (delayed)    | --> cache (stale)
//! +------------------+     +----------------------+
//!          \___________ shared Budget ___________/
//! ```
//!
//! # Core Types
//!
//! - [`Symbol`] - User-facing ticker string
//! - [`InstrumentKey`] - Provider-specific identifier, built only by the resolver
//! - [`Quote`] - Normalized quote with a `stale` flag
//! - [`QuoteOutcome`] - Live, cached, no data, or not found
//! - [`ProviderStatusTable`] - Per provider/exchange availability

pub mod aggregator;
pub mod errors;
pub mod models;
pub mod provider;
pub mod resolver;

// Re-export all public types from models
pub use models::{
    Exchange, InstrumentKey, ProviderId, ProviderQuote, Quote, QuoteOutcome, Symbol, BSE, NSE,
};

// Re-export aggregator types
pub use aggregator::{
    AggregatorConfig, Budget, FetchDiagnostics, MarketDataAggregator, QuoteReport, QuoteTier,
    SkipReason,
};

// Re-export resolver types
pub use resolver::{
    HttpInstrumentSource, InstrumentResolver, InstrumentSource, NormalizedSymbol, ProviderStatus,
    ProviderStatusTable, ResolutionSource, ResolvedInstrument, ResolverConfig,
};

// Re-export provider types
pub use provider::yahoo::YahooDelayedProvider;
pub use provider::{BrokerSession, DelayedQuoteProvider};

pub use errors::{MarketDataError, RetryClass};
