//! Quote provider trait definitions.
//!
//! Two kinds of upstream feed back the aggregator tiers:
//!
//! - [`BrokerSession`]: an authenticated live feed addressed by broker
//!   instrument keys. The session itself (login, token refresh) is owned
//!   by the host; the aggregator only asks whether it is connected.
//! - [`DelayedQuoteProvider`]: a public delayed feed addressed by its own
//!   ticker conventions (`RELIANCE.NS`, `^NSEI`).
//!
//! Both take batches. A symbol missing from the returned map means the
//! provider had no data for it; an `Err` applies to the whole batch.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{InstrumentKey, ProviderQuote};

/// Authenticated live broker feed.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use tradedesk_market_data::provider::BrokerSession;
///
/// struct PaperSession;
///
/// #[async_trait]
/// impl BrokerSession for PaperSession {
///     fn id(&self) -> &'static str {
///         "PAPER"
///     }
///
///     fn is_connected(&self) -> bool {
///         true
///     }
///
///     async fn fetch_quotes(
///         &self,
///         keys: &[InstrumentKey],
///     ) -> Result<HashMap<String, ProviderQuote>, MarketDataError> {
///         Ok(HashMap::new())
///     }
/// }
/// ```
#[async_trait]
pub trait BrokerSession: Send + Sync {
    /// Provider identifier, also the provider of the instrument keys it accepts.
    fn id(&self) -> &'static str;

    /// Whether an authenticated session currently exists.
    fn is_connected(&self) -> bool;

    /// Fetch quotes for a batch of instrument keys.
    ///
    /// The returned map is keyed by [`InstrumentKey::as_str`]. Authorization
    /// failures must be reported as [`MarketDataError::Unauthorized`].
    async fn fetch_quotes(
        &self,
        keys: &[InstrumentKey],
    ) -> Result<HashMap<String, ProviderQuote>, MarketDataError>;
}

/// Public delayed quote feed.
#[async_trait]
pub trait DelayedQuoteProvider: Send + Sync {
    /// Provider identifier ("YAHOO").
    fn id(&self) -> &'static str;

    /// Fetch quotes for a batch of provider tickers.
    ///
    /// The returned map is keyed by the ticker as requested.
    async fn fetch_quotes(
        &self,
        tickers: &[String],
    ) -> Result<HashMap<String, ProviderQuote>, MarketDataError>;
}
