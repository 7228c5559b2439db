//! Market data models
//!
//! This module contains the core data types for market data operations:
//! - `types` - Type aliases for provider and exchange identifiers
//! - `symbol` - User-facing ticker strings (Symbol)
//! - `instrument` - Provider-specific identifiers (InstrumentKey)
//! - `quote` - Quote data structures (ProviderQuote, Quote, QuoteOutcome)

mod instrument;
mod quote;
mod symbol;
mod types;

pub use instrument::InstrumentKey;
pub use quote::{ProviderQuote, Quote, QuoteOutcome};
pub use symbol::Symbol;
pub use types::{Exchange, ProviderId, BSE, NSE};
