//! Instrument resolution.
//!
//! Turns user-entered symbols into broker instrument keys and
//! delayed-provider tickers.
//!
//! ```text
//!  raw symbol ──► normalize ──► NormalizedSymbol ──┬─► InstrumentResolver ──► InstrumentKey
//!                                                  │     (bulk file, static aliases)
//!                                                  └─► delayed_tickers ──► ["^NSEI", ...]
//! ```
//!
//! The [`ProviderStatusTable`] shared with the aggregator records every
//! (provider, exchange) pair that failed authorization. Such pairs are never
//! retried for the rest of the process lifetime.

mod aliases;
mod instrument_resolver;
mod instrument_source;
mod instrument_table;
mod normalize;
mod provider_status;

pub use aliases::{compact_form, find_index_alias, IndexAlias, StaticAliasTable, INDEX_ALIASES};
pub use instrument_resolver::{
    InstrumentResolver, ResolutionSource, ResolvedInstrument, ResolverConfig,
};
pub use instrument_source::{HttpInstrumentSource, InstrumentSource};
pub use instrument_table::{parse_instrument_csv, InstrumentRecord, InstrumentTable};
pub use normalize::{delayed_tickers, normalize_symbol, NormalizedSymbol};
pub use provider_status::{ProviderStatus, ProviderStatusTable};
