use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::types::{Exchange, ProviderId};

/// Opaque provider-specific instrument identifier.
///
/// Bound to a (canonical symbol, provider, exchange) triple. Only the
/// resolver constructs these; callers receive them from
/// [`InstrumentResolver::resolve`](crate::resolver::InstrumentResolver::resolve).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct InstrumentKey {
    provider: ProviderId,
    exchange: Exchange,
    symbol: Arc<str>,
    key: Arc<str>,
}

impl InstrumentKey {
    pub(crate) fn new(
        provider: ProviderId,
        exchange: Exchange,
        symbol: impl Into<Arc<str>>,
        key: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            provider,
            exchange,
            symbol: symbol.into(),
            key: key.into(),
        }
    }

    /// Provider this key is valid for.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Exchange the instrument trades on.
    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    /// Canonical (normalized) symbol the key was resolved from.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The provider's identifier string.
    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for InstrumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}
