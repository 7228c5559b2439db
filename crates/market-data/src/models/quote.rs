use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::symbol::Symbol;

/// Raw quote as returned by a provider, before normalization.
///
/// Providers differ in which fields they fill; [`Quote::from_provider`]
/// derives the missing change figures from the previous close when possible.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProviderQuote {
    pub last_price: Decimal,
    pub change: Option<Decimal>,
    pub change_percent: Option<Decimal>,
    pub previous_close: Option<Decimal>,
    pub volume: Option<Decimal>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Normalized market snapshot for one symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Symbol as requested by the caller
    pub symbol: Symbol,

    /// Last traded price
    pub last_price: Decimal,

    /// Absolute change against the previous close
    pub change: Decimal,

    /// Change against the previous close, in percent
    pub change_percent: Decimal,

    /// Traded volume (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,

    /// Time of the last trade (or of the fetch when the provider omits it)
    pub timestamp: DateTime<Utc>,

    /// Provider the value came from ("BROKER", "YAHOO", ...)
    pub source: String,

    /// True iff the value was served from cache rather than a live
    /// round-trip completed during the current request
    pub stale: bool,
}

impl Quote {
    /// Build a live quote from a provider response.
    pub fn from_provider(symbol: Symbol, raw: ProviderQuote, source: &str) -> Self {
        let derived_change = raw.previous_close.map(|prev| raw.last_price - prev);
        let change = raw.change.or(derived_change).unwrap_or(Decimal::ZERO);

        let change_percent = raw.change_percent.unwrap_or_else(|| {
            match raw.previous_close {
                Some(prev) if !prev.is_zero() => change / prev * Decimal::ONE_HUNDRED,
                _ => Decimal::ZERO,
            }
        });

        Self {
            symbol,
            last_price: raw.last_price,
            change,
            change_percent,
            volume: raw.volume,
            timestamp: raw.timestamp.unwrap_or_else(Utc::now),
            source: source.to_string(),
            stale: false,
        }
    }

    /// Copy of this quote flagged as served from cache.
    pub fn into_stale(mut self) -> Self {
        self.stale = true;
        self
    }
}

/// Result of a quote request for one symbol.
///
/// `NoData` and `SymbolNotFound` are distinct from a stale-but-present quote
/// and must be handled as such by callers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "quote", rename_all = "camelCase")]
pub enum QuoteOutcome {
    /// Obtained from a live or delayed provider during this request.
    Live(Quote),
    /// Every live tier failed; last known value, `stale = true`.
    Cached(Quote),
    /// Every tier failed and nothing is cached.
    NoData,
    /// The symbol is definitively unknown and nothing is cached.
    SymbolNotFound,
}

impl QuoteOutcome {
    pub fn quote(&self) -> Option<&Quote> {
        match self {
            Self::Live(quote) | Self::Cached(quote) => Some(quote),
            Self::NoData | Self::SymbolNotFound => None,
        }
    }

    pub fn into_quote(self) -> Option<Quote> {
        match self {
            Self::Live(quote) | Self::Cached(quote) => Some(quote),
            Self::NoData | Self::SymbolNotFound => None,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }
}
