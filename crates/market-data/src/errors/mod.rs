//! Error types and fallback classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for resolution and quote fetching
//! - [`RetryClass`]: How the aggregator reacts to an error from a tier

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur during instrument resolution and quote fetching.
///
/// Errors are `Clone` so a single failed batch round-trip can be reported
/// against every symbol it carried. Transport errors are mapped into
/// [`Timeout`](Self::Timeout) or [`ProviderError`](Self::ProviderError) at the
/// provider boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketDataError {
    /// The symbol is definitively unknown.
    ///
    /// Raised by the resolver when an authoritative instrument table exists
    /// for the exchange and neither it nor the static alias table matches, or
    /// by a provider that answered but had no instrument under any known
    /// identifier. Skips the remaining live tiers.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The resolver could not map the symbol, but had no authoritative
    /// instrument table to be sure. Another tier may still know it.
    #[error("Resolution failed for provider: {provider}")]
    ResolutionFailed {
        /// The provider the resolution was attempted for
        provider: String,
    },

    /// The provider call did not complete before its deadline.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The provider rejected the request as unauthenticated or forbidden.
    ///
    /// The provider/exchange pair is marked unavailable for the rest of the
    /// process lifetime.
    #[error("Unauthorized: {provider} - {message}")]
    Unauthorized {
        /// The provider that rejected the request
        provider: String,
        /// Detail returned by the provider
        message: String,
    },

    /// The provider rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// A provider-specific error occurred (network, HTTP status, parse).
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message
        message: String,
    },

    /// The bulk instrument file could not be downloaded or parsed.
    #[error("Instrument download failed for {exchange}: {message}")]
    DownloadFailed {
        /// Exchange whose instrument file was requested
        exchange: String,
        /// Failure detail
        message: String,
    },
}

impl MarketDataError {
    /// Returns the fallback classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use tradedesk_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::Timeout { provider: "BROKER".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::NextTier);
    ///
    /// let error = MarketDataError::SymbolNotFound("INVALID".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::SkipToCache);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::SymbolNotFound(_) => RetryClass::SkipToCache,

            Self::Unauthorized { .. } => RetryClass::NextTierAndDisable,

            Self::ResolutionFailed { .. }
            | Self::Timeout { .. }
            | Self::RateLimited { .. }
            | Self::ProviderError { .. }
            | Self::DownloadFailed { .. } => RetryClass::NextTier,
        }
    }

    /// True for authorization/permission failures.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Map a transport error into the crate's taxonomy.
    pub fn from_reqwest(provider: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::Timeout {
                provider: provider.to_string(),
            };
        }
        match error.status() {
            Some(status)
                if status == reqwest::StatusCode::UNAUTHORIZED
                    || status == reqwest::StatusCode::FORBIDDEN =>
            {
                Self::Unauthorized {
                    provider: provider.to_string(),
                    message: status.to_string(),
                }
            }
            Some(status) if status == reqwest::StatusCode::TOO_MANY_REQUESTS => Self::RateLimited {
                provider: provider.to_string(),
            },
            _ => Self::ProviderError {
                provider: provider.to_string(),
                message: format!("Request failed: {}", error),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_not_found_skips_to_cache() {
        let error = MarketDataError::SymbolNotFound("INVALID".to_string());
        assert_eq!(error.retry_class(), RetryClass::SkipToCache);
    }

    #[test]
    fn test_unauthorized_disables_provider() {
        let error = MarketDataError::Unauthorized {
            provider: "BROKER".to_string(),
            message: "401 Unauthorized".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::NextTierAndDisable);
        assert!(error.is_unauthorized());
    }

    #[test]
    fn test_transient_errors_fall_through() {
        let errors = [
            MarketDataError::Timeout {
                provider: "YAHOO".to_string(),
            },
            MarketDataError::RateLimited {
                provider: "YAHOO".to_string(),
            },
            MarketDataError::ResolutionFailed {
                provider: "BROKER".to_string(),
            },
            MarketDataError::DownloadFailed {
                exchange: "NSE".to_string(),
                message: "HTTP 500".to_string(),
            },
        ];
        for error in errors {
            assert_eq!(error.retry_class(), RetryClass::NextTier, "{error}");
        }
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::SymbolNotFound("INVALID".to_string());
        assert_eq!(format!("{}", error), "Symbol not found: INVALID");

        let error = MarketDataError::ProviderError {
            provider: "YAHOO".to_string(),
            message: "HTTP 500".to_string(),
        };
        assert_eq!(format!("{}", error), "Provider error: YAHOO - HTTP 500");
    }
}
