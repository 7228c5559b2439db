//! Symbol normalization.
//!
//! Rewrites the common user-entered variants of a ticker into one canonical
//! root plus an exchange, so instrument lookups are case- and
//! variant-insensitive:
//!
//! | Input | Root | Exchange |
//! |-------|------|----------|
//! | `reliance` | `RELIANCE` | default |
//! | `NSE:RELIANCE` | `RELIANCE` | `NSE` |
//! | `RELIANCE.BO` | `RELIANCE` | `BSE` |
//! | `SBIN-EQ` | `SBIN` | default |
//! | `nifty_50`, `Nifty`, `^NSEI` | `NIFTY 50` | `NSE` |

use std::fmt;

use serde::Serialize;

use super::aliases::{compact_form, find_index_alias};
use crate::models::{BSE, NSE};

/// Exchange prefixes accepted in `EXCHANGE:SYMBOL` form.
const KNOWN_EXCHANGES: &[&str] = &["NSE", "BSE", "NFO", "BFO", "MCX", "CDS"];

/// Delayed-provider style exchange suffixes.
const EXCHANGE_SUFFIXES: &[(&str, &str)] = &[
    (".NSE", NSE),
    (".NS", NSE),
    (".BSE", BSE),
    (".BO", BSE),
];

/// Trading series suffixes that do not change the instrument.
const SERIES_SUFFIXES: &[&str] = &["-EQ", "-BE", "-BZ"];

/// A symbol after the rewrite rules have been applied.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct NormalizedSymbol {
    /// Canonical root, upper case, single-spaced
    pub root: String,
    /// Exchange the lookup applies to
    pub exchange: String,
    /// True when the root is a well-known index from the alias table
    pub is_index: bool,
}

impl NormalizedSymbol {
    /// Stable key for per-instrument state such as the quote cache.
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.exchange, self.root)
    }
}

impl fmt::Display for NormalizedSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.exchange, self.root)
    }
}

/// Apply the rewrite rules to a raw symbol.
///
/// Exchange precedence: `exchange_hint`, then an exchange implied by a
/// prefix or suffix, then the exchange of a matched index, then
/// `default_exchange`.
pub fn normalize_symbol(
    raw: &str,
    exchange_hint: Option<&str>,
    default_exchange: &str,
) -> NormalizedSymbol {
    let mut text = raw.trim().to_uppercase();
    let mut implied: Option<&'static str> = None;

    if let Some((prefix, rest)) = text.split_once(':') {
        let prefix = prefix.trim();
        if let Some(exchange) = KNOWN_EXCHANGES.iter().find(|e| **e == prefix) {
            implied = Some(*exchange);
            text = rest.to_string();
        }
    }

    if let Some((suffix, exchange)) = EXCHANGE_SUFFIXES
        .iter()
        .find(|(suffix, _)| text.ends_with(suffix) && text.len() > suffix.len())
    {
        text.truncate(text.len() - suffix.len());
        implied.get_or_insert(*exchange);
    }

    if let Some(series) = SERIES_SUFFIXES
        .iter()
        .find(|series| text.ends_with(*series) && text.len() > series.len())
    {
        text.truncate(text.len() - series.len());
    }

    let collapsed = text
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let hint = exchange_hint
        .map(|e| e.trim().to_uppercase())
        .filter(|e| !e.is_empty());

    if let Some(alias) = find_index_alias(&compact_form(&collapsed)) {
        let exchange = hint
            .or(implied.map(str::to_string))
            .unwrap_or_else(|| alias.exchange.to_string());
        return NormalizedSymbol {
            root: alias.canonical.to_string(),
            exchange,
            is_index: true,
        };
    }

    let exchange = hint
        .or(implied.map(str::to_string))
        .unwrap_or_else(|| default_exchange.to_uppercase());

    NormalizedSymbol {
        root: collapsed,
        exchange,
        is_index: false,
    }
}

/// Conventional tickers for a delayed-data provider, in the order to try.
///
/// Indices use every known alternate format from the alias table; equities
/// get the exchange suffix.
pub fn delayed_tickers(symbol: &NormalizedSymbol) -> Vec<String> {
    if symbol.is_index {
        if let Some(alias) = find_index_alias(&compact_form(&symbol.root)) {
            return alias.delayed_tickers.iter().map(|t| t.to_string()).collect();
        }
    }

    let base = symbol.root.replace(' ', "");
    let ticker = match symbol.exchange.as_str() {
        NSE => format!("{}.NS", base),
        BSE => format!("{}.BO", base),
        _ => base,
    };
    vec![ticker]
}
