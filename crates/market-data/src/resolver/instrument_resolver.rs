//! Symbol -> broker instrument key resolution.
//!
//! Lookup order for a normalized symbol:
//!
//! ```text
//! bulk instrument table ──miss──► bulk download for the exchange (if due)
//!        │                                 │
//!        │ hit                        hit / miss
//!        ▼                                 ▼
//!    BulkFile                     static alias table ──miss──► not found
//!                                          │
//!                                          ▼
//!                                     StaticAlias
//! ```
//!
//! Downloads run on their own task, at most one per exchange. A caller that
//! gives up waiting does not abort the download, and
//! [`InstrumentResolver::resolve_without_waiting`] never waits at all.
//!
//! "Not found" is reported as [`MarketDataError::SymbolNotFound`] when the
//! bulk table for the exchange is loaded (the answer is authoritative) and
//! as [`MarketDataError::ResolutionFailed`] otherwise.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use log::{debug, info, warn};
use serde::Deserialize;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::Instant;

use super::aliases::StaticAliasTable;
use super::instrument_source::InstrumentSource;
use super::instrument_table::InstrumentTable;
use super::normalize::{delayed_tickers, normalize_symbol, NormalizedSymbol};
use super::provider_status::ProviderStatusTable;
use crate::errors::MarketDataError;
use crate::models::{InstrumentKey, ProviderId, Symbol, NSE};

/// Resolver settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverConfig {
    /// Provider whose instrument keys are produced
    pub provider: String,
    /// Exchange assumed when the symbol does not imply one
    pub default_exchange: String,
    /// Wait after a failed (non-authorization) download before trying again
    pub download_retry_after_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            provider: "BROKER".to_string(),
            default_exchange: NSE.to_string(),
            download_retry_after_secs: 300,
        }
    }
}

/// Where a resolution came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResolutionSource {
    /// Downloaded bulk instrument file
    BulkFile,
    /// Built-in alias table
    StaticAlias,
}

/// Resolution result containing the key and its source.
#[derive(Clone, Debug)]
pub struct ResolvedInstrument {
    pub key: InstrumentKey,
    pub source: ResolutionSource,
}

/// Bulk-file state, shared with the download tasks.
#[derive(Default)]
struct BulkState {
    table: RwLock<InstrumentTable>,
    failed_downloads: Mutex<HashMap<String, Instant>>,
    /// Exchanges with a download running; the receiver flips to `true` when it ends.
    in_flight: Mutex<HashMap<String, watch::Receiver<bool>>>,
}

impl BulkState {
    fn table_read(&self) -> RwLockReadGuard<'_, InstrumentTable> {
        self.table.read().unwrap_or_else(|poisoned| {
            warn!("Instrument table lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn table_write(&self) -> RwLockWriteGuard<'_, InstrumentTable> {
        self.table.write().unwrap_or_else(|poisoned| {
            warn!("Instrument table lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn failed_downloads(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        self.failed_downloads.lock().unwrap_or_else(|poisoned| {
            warn!("Download state lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn in_flight(&self) -> MutexGuard<'_, HashMap<String, watch::Receiver<bool>>> {
        self.in_flight.lock().unwrap_or_else(|poisoned| {
            warn!("Download state lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Fetch one exchange's file and record the result.
    async fn download(
        &self,
        source: &dyn InstrumentSource,
        status: &ProviderStatusTable,
        exchange: &str,
    ) {
        info!("Downloading bulk instrument file for {}", exchange);

        match source.fetch(exchange).await {
            Ok(records) => {
                let count = self.table_write().load(exchange, records);
                self.failed_downloads().remove(exchange);
                info!("Loaded {} instruments for {}", count, exchange);
            }
            Err(e) if e.is_unauthorized() => {
                status.mark_unavailable(source.id(), exchange, e.to_string());
            }
            Err(e) => {
                warn!(
                    "Instrument download for {} failed, falling back to static aliases: {}",
                    exchange, e
                );
                self.failed_downloads()
                    .insert(exchange.to_string(), Instant::now());
            }
        }

        debug!(
            "Instrument table for {} now holds {} entries",
            exchange,
            self.table_read().len(exchange)
        );
    }
}

/// Resolves user-facing symbols to broker instrument keys.
///
/// Shared across requests. The instrument table and provider status table
/// are read-mostly; writes happen when a bulk download ends or on an
/// authorization failure.
pub struct InstrumentResolver {
    config: ResolverConfig,
    statics: StaticAliasTable,
    bulk: Arc<BulkState>,
    status: Arc<ProviderStatusTable>,
    source: Option<Arc<dyn InstrumentSource>>,
    reported_static: Mutex<HashSet<String>>,
}

impl InstrumentResolver {
    /// Resolver backed by the static alias table only.
    pub fn new(config: ResolverConfig, status: Arc<ProviderStatusTable>) -> Self {
        Self {
            config,
            statics: StaticAliasTable::new(),
            bulk: Arc::new(BulkState::default()),
            status,
            source: None,
            reported_static: Mutex::new(HashSet::new()),
        }
    }

    /// Enable lazy bulk downloads from `source`.
    pub fn with_source(mut self, source: Arc<dyn InstrumentSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Replace the static alias table.
    pub fn with_static_aliases(mut self, statics: StaticAliasTable) -> Self {
        self.statics = statics;
        self
    }

    pub fn provider(&self) -> &str {
        &self.config.provider
    }

    pub fn default_exchange(&self) -> &str {
        &self.config.default_exchange
    }

    pub fn status_table(&self) -> &Arc<ProviderStatusTable> {
        &self.status
    }

    /// True when a bulk instrument source is configured.
    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Apply the normalization rules with this resolver's default exchange.
    pub fn normalize(&self, symbol: &Symbol, exchange: Option<&str>) -> NormalizedSymbol {
        normalize_symbol(symbol.as_str(), exchange, &self.config.default_exchange)
    }

    /// Delayed-provider tickers to try for a symbol, in order.
    pub fn delayed_candidates(&self, symbol: &NormalizedSymbol) -> Vec<String> {
        delayed_tickers(symbol)
    }

    /// Resolve a symbol, waiting for the exchange's bulk file on first miss.
    pub async fn resolve(
        &self,
        symbol: &Symbol,
        exchange: Option<&str>,
    ) -> Result<ResolvedInstrument, MarketDataError> {
        let normalized = self.normalize(symbol, exchange);
        self.resolve_normalized(&normalized).await
    }

    /// Resolve an already normalized symbol, waiting for a due download.
    ///
    /// Dropping the returned future stops the wait, not the download.
    pub async fn resolve_normalized(
        &self,
        symbol: &NormalizedSymbol,
    ) -> Result<ResolvedInstrument, MarketDataError> {
        if symbol.root.is_empty() {
            return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
        }

        if let Some(resolved) = self.lookup_bulk(symbol) {
            return Ok(resolved);
        }

        if let Some(mut done) = self.start_download(&symbol.exchange) {
            // An error means the task ended without reporting back.
            let _ = done.wait_for(|finished| *finished).await;
            if let Some(resolved) = self.lookup_bulk(symbol) {
                return Ok(resolved);
            }
        }

        self.resolve_static(symbol)
    }

    /// Resolve from memory, starting the exchange's bulk download in the
    /// background if one is due. Never waits on the download.
    pub fn resolve_without_waiting(
        &self,
        symbol: &NormalizedSymbol,
    ) -> Result<ResolvedInstrument, MarketDataError> {
        if symbol.root.is_empty() {
            return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
        }

        if let Some(resolved) = self.lookup_bulk(symbol) {
            return Ok(resolved);
        }

        self.start_download(&symbol.exchange);
        self.resolve_static(symbol)
    }

    /// Resolve from what is already in memory, never downloading.
    pub fn resolve_cached(
        &self,
        symbol: &Symbol,
        exchange: Option<&str>,
    ) -> Result<ResolvedInstrument, MarketDataError> {
        let normalized = self.normalize(symbol, exchange);
        if normalized.root.is_empty() {
            return Err(MarketDataError::SymbolNotFound(normalized.to_string()));
        }
        match self.lookup_bulk(&normalized) {
            Some(resolved) => Ok(resolved),
            None => self.resolve_static(&normalized),
        }
    }

    /// True once the bulk table for `exchange` has been loaded.
    pub fn is_exchange_loaded(&self, exchange: &str) -> bool {
        self.bulk.table_read().is_loaded(exchange)
    }

    /// True while a bulk download for `exchange` is running.
    pub fn is_downloading(&self, exchange: &str) -> bool {
        self.bulk.in_flight().contains_key(exchange)
    }

    fn make_key(&self, symbol: &NormalizedSymbol, key: Arc<str>) -> InstrumentKey {
        InstrumentKey::new(
            ProviderId::Owned(self.config.provider.clone()),
            symbol.exchange.clone().into(),
            symbol.root.as_str(),
            key,
        )
    }

    fn lookup_bulk(&self, symbol: &NormalizedSymbol) -> Option<ResolvedInstrument> {
        let key = self.bulk.table_read().lookup(&symbol.exchange, &symbol.root)?;
        Some(ResolvedInstrument {
            key: self.make_key(symbol, key),
            source: ResolutionSource::BulkFile,
        })
    }

    fn resolve_static(&self, symbol: &NormalizedSymbol) -> Result<ResolvedInstrument, MarketDataError> {
        if let Some(key) = self.statics.lookup(&symbol.exchange, &symbol.root) {
            self.report_static_resolution(symbol);
            return Ok(ResolvedInstrument {
                key: self.make_key(symbol, key),
                source: ResolutionSource::StaticAlias,
            });
        }

        if self.bulk.table_read().is_loaded(&symbol.exchange) {
            Err(MarketDataError::SymbolNotFound(symbol.to_string()))
        } else {
            Err(MarketDataError::ResolutionFailed {
                provider: self.config.provider.clone(),
            })
        }
    }

    /// Log once per symbol when the static table answers instead of the bulk file.
    fn report_static_resolution(&self, symbol: &NormalizedSymbol) {
        let mut reported = self.reported_static.lock().unwrap_or_else(|poisoned| {
            warn!("Static resolution log lock was poisoned, recovering");
            poisoned.into_inner()
        });
        if reported.insert(symbol.cache_key()) {
            info!(
                "Resolved '{}' from the static alias table (bulk instrument file unavailable or missing it)",
                symbol
            );
        }
    }

    fn download_due(&self, exchange: &str) -> bool {
        let Some(source) = &self.source else {
            return false;
        };
        if !source.covers(exchange) || self.bulk.table_read().is_loaded(exchange) {
            return false;
        }
        if !self.status.is_available(source.id(), exchange) {
            return false;
        }
        let retry_after = Duration::from_secs(self.config.download_retry_after_secs);
        match self.bulk.failed_downloads().get(exchange) {
            Some(failed_at) => failed_at.elapsed() >= retry_after,
            None => true,
        }
    }

    /// Join the running download for `exchange`, or spawn one if due.
    ///
    /// Returns `None` when no download is running or due.
    fn start_download(&self, exchange: &str) -> Option<watch::Receiver<bool>> {
        let source = self.source.clone()?;
        let mut in_flight = self.bulk.in_flight();

        match in_flight
            .get(exchange)
            .map(|done| (done.clone(), done.has_changed().is_ok()))
        {
            Some((done, true)) => return Some(done),
            // The task went away without reporting back.
            Some((_, false)) => {
                in_flight.remove(exchange);
            }
            None => {}
        }

        if !self.download_due(exchange) {
            return None;
        }

        let Ok(runtime) = Handle::try_current() else {
            debug!("No runtime available, skipping instrument download for {}", exchange);
            return None;
        };

        let (done_tx, done_rx) = watch::channel(false);
        in_flight.insert(exchange.to_string(), done_rx.clone());
        drop(in_flight);

        let bulk = Arc::clone(&self.bulk);
        let status = Arc::clone(&self.status);
        let exchange = exchange.to_string();
        runtime.spawn(async move {
            bulk.download(source.as_ref(), &status, &exchange).await;
            bulk.in_flight().remove(&exchange);
            let _ = done_tx.send(true);
        });

        Some(done_rx)
    }
}
