//! In-memory instrument table populated from bulk instrument files.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::normalize::normalize_symbol;
use crate::errors::MarketDataError;

/// One row of a broker bulk instrument file.
///
/// Only the columns needed for resolution are read; the files carry many
/// more (lot size, tick size, expiry, ...) which are ignored.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct InstrumentRecord {
    /// Broker instrument key, e.g. `NSE_EQ|INE002A01018`
    pub instrument_key: String,
    /// Exchange trading symbol, e.g. `RELIANCE`
    pub tradingsymbol: String,
    #[serde(default)]
    pub name: String,
    /// Exchange segment, e.g. `NSE_EQ`, `NSE_INDEX`
    #[serde(default)]
    pub exchange: String,
}

/// Parse a bulk instrument CSV file (header row required).
pub fn parse_instrument_csv(
    exchange: &str,
    data: &[u8],
) -> Result<Vec<InstrumentRecord>, MarketDataError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data);

    reader
        .deserialize::<InstrumentRecord>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| MarketDataError::DownloadFailed {
            exchange: exchange.to_string(),
            message: format!("Invalid instrument file: {}", e),
        })
}

#[derive(Debug)]
struct ExchangeInstruments {
    by_root: HashMap<String, Arc<str>>,
    loaded_at: DateTime<Utc>,
}

/// Normalized root -> broker key, per exchange.
#[derive(Debug, Default)]
pub struct InstrumentTable {
    exchanges: HashMap<String, ExchangeInstruments>,
}

impl InstrumentTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self, exchange: &str) -> bool {
        self.exchanges.contains_key(exchange)
    }

    /// Replace the table for `exchange` with `records`.
    ///
    /// Rows belonging to another exchange segment are skipped. When two rows
    /// normalize to the same root the first one wins. Returns the number of
    /// distinct roots loaded.
    pub fn load(&mut self, exchange: &str, records: Vec<InstrumentRecord>) -> usize {
        let mut by_root = HashMap::with_capacity(records.len());

        for record in records {
            let segment = record.exchange.to_uppercase();
            if !segment.is_empty() && !segment.starts_with(exchange) {
                continue;
            }
            if record.instrument_key.is_empty() || record.tradingsymbol.is_empty() {
                continue;
            }
            let root = normalize_symbol(&record.tradingsymbol, Some(exchange), exchange).root;
            by_root
                .entry(root)
                .or_insert_with(|| Arc::from(record.instrument_key.as_str()));
        }

        let count = by_root.len();
        self.exchanges.insert(
            exchange.to_string(),
            ExchangeInstruments {
                by_root,
                loaded_at: Utc::now(),
            },
        );
        count
    }

    pub fn lookup(&self, exchange: &str, root: &str) -> Option<Arc<str>> {
        self.exchanges
            .get(exchange)
            .and_then(|instruments| instruments.by_root.get(root))
            .cloned()
    }

    /// When the exchange table was loaded, if it was.
    pub fn loaded_at(&self, exchange: &str) -> Option<DateTime<Utc>> {
        self.exchanges.get(exchange).map(|i| i.loaded_at)
    }

    pub fn len(&self, exchange: &str) -> usize {
        self.exchanges
            .get(exchange)
            .map(|i| i.by_root.len())
            .unwrap_or(0)
    }
}
