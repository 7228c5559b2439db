//! Static alias table for well-known indices.
//!
//! Delayed-data providers disagree on index naming, and users type indices
//! in many forms ("NIFTY", "Nifty 50", "NIFTY_50", "^NSEI"). Each entry
//! pins one canonical root, the broker key for it, and every known
//! delayed-provider ticker in the order they should be tried.

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{BSE, NSE};

/// A well-known index and its identifiers.
#[derive(Debug)]
pub struct IndexAlias {
    /// Canonical root used for every lookup ("NIFTY 50")
    pub canonical: &'static str,
    /// Exchange the index is published on
    pub exchange: &'static str,
    /// Accepted user spellings, compared with whitespace removed
    pub aliases: &'static [&'static str],
    /// Broker instrument key
    pub broker_key: &'static str,
    /// Delayed-provider tickers, most reliable first
    pub delayed_tickers: &'static [&'static str],
}

pub const INDEX_ALIASES: &[IndexAlias] = &[
    IndexAlias {
        canonical: "NIFTY 50",
        exchange: NSE,
        aliases: &["NIFTY", "NIFTY50", "^NSEI", "NSEI", "CNXNIFTY"],
        broker_key: "NSE_INDEX|Nifty 50",
        delayed_tickers: &["^NSEI", "^CNXNIFTY", "NIFTY_50.NS"],
    },
    IndexAlias {
        canonical: "NIFTY BANK",
        exchange: NSE,
        aliases: &["BANKNIFTY", "NIFTYBANK", "^NSEBANK", "NSEBANK"],
        broker_key: "NSE_INDEX|Nifty Bank",
        delayed_tickers: &["^NSEBANK", "^CNXBANK", "NIFTY_BANK.NS"],
    },
    IndexAlias {
        canonical: "NIFTY FIN SERVICE",
        exchange: NSE,
        aliases: &["FINNIFTY", "NIFTYFIN", "NIFTYFINSERVICE", "^CNXFIN"],
        broker_key: "NSE_INDEX|Nifty Fin Service",
        delayed_tickers: &["NIFTY_FIN_SERVICE.NS", "^CNXFIN"],
    },
    IndexAlias {
        canonical: "NIFTY IT",
        exchange: NSE,
        aliases: &["NIFTYIT", "CNXIT", "^CNXIT"],
        broker_key: "NSE_INDEX|Nifty IT",
        delayed_tickers: &["^CNXIT", "NIFTY_IT.NS"],
    },
    IndexAlias {
        canonical: "INDIA VIX",
        exchange: NSE,
        aliases: &["INDIAVIX", "VIX", "^INDIAVIX"],
        broker_key: "NSE_INDEX|India VIX",
        delayed_tickers: &["^INDIAVIX"],
    },
    IndexAlias {
        canonical: "SENSEX",
        exchange: BSE,
        aliases: &["SENSEX", "BSESENSEX", "^BSESN", "BSESN"],
        broker_key: "BSE_INDEX|SENSEX",
        delayed_tickers: &["^BSESN", "SENSEX.BO"],
    },
];

/// Find an index by any of its spellings (whitespace-insensitive, upper case).
pub fn find_index_alias(compact: &str) -> Option<&'static IndexAlias> {
    INDEX_ALIASES.iter().find(|alias| {
        compact_form(alias.canonical) == compact || alias.aliases.iter().any(|a| *a == compact)
    })
}

/// Remove all whitespace, used to compare index spellings.
pub fn compact_form(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Static (exchange, canonical root) -> broker key table.
///
/// Seeded from [`INDEX_ALIASES`]; extra entries can be registered at
/// startup. Consulted after the bulk instrument file.
#[derive(Debug, Clone)]
pub struct StaticAliasTable {
    entries: HashMap<(String, String), Arc<str>>,
}

impl StaticAliasTable {
    pub fn new() -> Self {
        let entries = INDEX_ALIASES
            .iter()
            .map(|alias| {
                (
                    (alias.exchange.to_string(), alias.canonical.to_string()),
                    Arc::from(alias.broker_key),
                )
            })
            .collect();
        Self { entries }
    }

    /// Register or replace an entry. `root` must already be normalized.
    pub fn insert(&mut self, exchange: &str, root: &str, broker_key: &str) {
        self.entries.insert(
            (exchange.to_string(), root.to_string()),
            Arc::from(broker_key),
        );
    }

    pub fn lookup(&self, exchange: &str, root: &str) -> Option<Arc<str>> {
        self.entries
            .get(&(exchange.to_string(), root.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StaticAliasTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_index_alias_by_any_spelling() {
        for spelling in ["NIFTY", "NIFTY50", "^NSEI"] {
            let alias = find_index_alias(spelling).expect(spelling);
            assert_eq!(alias.canonical, "NIFTY 50");
        }
        assert_eq!(
            find_index_alias("BANKNIFTY").map(|a| a.canonical),
            Some("NIFTY BANK")
        );
        assert!(find_index_alias("RELIANCE").is_none());
    }

    #[test]
    fn test_aliases_are_unique_across_indices() {
        let mut seen = std::collections::HashSet::new();
        for alias in INDEX_ALIASES {
            assert!(seen.insert(compact_form(alias.canonical)));
            for spelling in alias.aliases {
                if *spelling != compact_form(alias.canonical) {
                    assert!(seen.insert(spelling.to_string()), "duplicate {spelling}");
                }
            }
        }
    }

    #[test]
    fn test_static_table_seeded_with_indices() {
        let table = StaticAliasTable::new();
        assert_eq!(table.len(), INDEX_ALIASES.len());
        assert_eq!(
            table.lookup(NSE, "NIFTY 50").as_deref(),
            Some("NSE_INDEX|Nifty 50")
        );
        assert_eq!(
            table.lookup(BSE, "SENSEX").as_deref(),
            Some("BSE_INDEX|SENSEX")
        );
        assert!(table.lookup(BSE, "NIFTY 50").is_none());
    }

    #[test]
    fn test_static_table_insert() {
        let mut table = StaticAliasTable::new();
        table.insert(NSE, "RELIANCE", "NSE_EQ|INE002A01018");
        assert_eq!(
            table.lookup(NSE, "RELIANCE").as_deref(),
            Some("NSE_EQ|INE002A01018")
        );
    }
}
