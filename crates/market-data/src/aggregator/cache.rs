use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::warn;

use crate::models::{Quote, Symbol};

/// Last live quote per instrument.
///
/// Keyed by the normalized `EXCHANGE:ROOT` form so every spelling of a
/// symbol shares one entry.
#[derive(Debug, Default)]
pub struct QuoteCache {
    entries: RwLock<HashMap<String, Quote>>,
}

impl QuoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Quote>> {
        self.entries.read().unwrap_or_else(|poisoned| {
            warn!("Quote cache lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Quote>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            warn!("Quote cache lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Store a live quote. Older quotes never replace newer ones.
    pub fn put(&self, key: &str, quote: &Quote) {
        let mut entries = self.write();
        let newer = entries
            .get(key)
            .map_or(true, |existing| existing.timestamp <= quote.timestamp);
        if newer {
            let mut quote = quote.clone();
            quote.stale = false;
            entries.insert(key.to_string(), quote);
        }
    }

    /// Cached quote re-labelled for `symbol`, flagged stale.
    pub fn get_stale(&self, key: &str, symbol: &Symbol) -> Option<Quote> {
        self.read().get(key).map(|quote| {
            let mut quote = quote.clone().into_stale();
            quote.symbol = symbol.clone();
            quote
        })
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::ProviderQuote;

    fn quote(symbol: &str, price: rust_decimal::Decimal, minutes_ago: i64) -> Quote {
        Quote::from_provider(
            Symbol::from(symbol),
            ProviderQuote {
                last_price: price,
                timestamp: Some(Utc::now() - Duration::minutes(minutes_ago)),
                ..Default::default()
            },
            "YAHOO",
        )
    }

    #[test]
    fn test_served_stale_under_requested_symbol() {
        let cache = QuoteCache::new();
        cache.put("NSE:NIFTY 50", &quote("^NSEI", dec!(25000), 5));

        let cached = cache.get_stale("NSE:NIFTY 50", &Symbol::from("nifty")).unwrap();

        assert!(cached.stale);
        assert_eq!(cached.symbol.as_str(), "nifty");
        assert_eq!(cached.last_price, dec!(25000));
        assert!(cache.get_stale("NSE:TCS", &Symbol::from("TCS")).is_none());
    }

    #[test]
    fn test_older_quote_does_not_replace_newer() {
        let cache = QuoteCache::new();
        cache.put("NSE:TCS", &quote("TCS", dec!(2000), 1));
        cache.put("NSE:TCS", &quote("TCS", dec!(1990), 10));

        let cached = cache.get_stale("NSE:TCS", &Symbol::from("TCS")).unwrap();
        assert_eq!(cached.last_price, dec!(2000));
        assert_eq!(cache.len(), 1);
    }
}
