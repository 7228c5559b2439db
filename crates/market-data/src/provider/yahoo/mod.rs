//! Yahoo Finance delayed quote provider.
//!
//! Uses the batch quote endpoint so one round-trip serves a whole request:
//! - Equities with exchange suffixes (e.g., RELIANCE.NS, TCS.BO)
//! - Indices (e.g., ^NSEI, ^BSESN)

mod models;

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use log::warn;
use num_traits::FromPrimitive;
use reqwest::{header, Client, StatusCode};
use rust_decimal::Decimal;
use tracing::debug;
use urlencoding::encode;

use crate::errors::MarketDataError;
use crate::models::ProviderQuote;
use crate::provider::DelayedQuoteProvider;

use models::{YahooQuote, YahooQuoteResponse};

const PROVIDER_ID: &str = "YAHOO";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

const QUOTE_URL: &str = "https://query1.finance.yahoo.com/v7/finance/quote";

/// Tickers per request; the endpoint rejects very long symbol lists
const MAX_TICKERS_PER_REQUEST: usize = 50;

// ============================================================================
// Crumb/Cookie Authentication
// ============================================================================

/// Cached Yahoo authentication data
#[derive(Debug, Clone)]
struct CrumbData {
    cookie: String,
    crumb: String,
}

// ============================================================================
// Yahoo Provider
// ============================================================================

/// Yahoo Finance delayed quote provider.
pub struct YahooDelayedProvider {
    client: Client,
    crumb: RwLock<Option<CrumbData>>,
}

impl YahooDelayedProvider {
    pub fn new() -> Self {
        // Per-call deadlines come from the aggregator; this is only a backstop.
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            crumb: RwLock::new(None),
        }
    }

    fn cached_crumb(&self) -> Option<CrumbData> {
        self.crumb
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn store_crumb(&self, crumb: Option<CrumbData>) {
        *self
            .crumb
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = crumb;
    }

    /// Ensure we have a valid Yahoo authentication crumb.
    async fn ensure_crumb(&self) -> Result<CrumbData, MarketDataError> {
        if let Some(crumb) = self.cached_crumb() {
            return Ok(crumb);
        }
        let crumb = self.fetch_crumb().await?;
        self.store_crumb(Some(crumb.clone()));
        Ok(crumb)
    }

    /// Fetch a new Yahoo authentication crumb.
    async fn fetch_crumb(&self) -> Result<CrumbData, MarketDataError> {
        // Step 1: Get cookie from fc.yahoo.com
        let response = self
            .client
            .get("https://fc.yahoo.com")
            .send()
            .await
            .map_err(|e| MarketDataError::from_reqwest(PROVIDER_ID, e))?;

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split_once(';').map(|(v, _)| v.to_string()))
            .ok_or_else(|| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: "Failed to parse Yahoo cookie".to_string(),
            })?;

        // Step 2: Get crumb using cookie
        let crumb = self
            .client
            .get("https://query1.finance.yahoo.com/v1/test/getcrumb")
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::COOKIE, &cookie)
            .send()
            .await
            .map_err(|e| MarketDataError::from_reqwest(PROVIDER_ID, e))?
            .text()
            .await
            .map_err(|e| MarketDataError::from_reqwest(PROVIDER_ID, e))?;

        Ok(CrumbData { cookie, crumb })
    }

    /// One batch request. `Ok(None)` means the crumb was rejected.
    async fn request_batch(
        &self,
        tickers: &[String],
        crumb: &CrumbData,
    ) -> Result<Option<Vec<YahooQuote>>, MarketDataError> {
        let symbols = tickers
            .iter()
            .map(|t| encode(t).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!(
            "{}?symbols={}&crumb={}",
            QUOTE_URL,
            symbols,
            encode(&crumb.crumb)
        );

        let response = self
            .client
            .get(&url)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::COOKIE, &crumb.cookie)
            .send()
            .await
            .map_err(|e| MarketDataError::from_reqwest(PROVIDER_ID, e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        if status == StatusCode::FORBIDDEN {
            return Err(MarketDataError::Unauthorized {
                provider: PROVIDER_ID.to_string(),
                message: "Quote request forbidden".to_string(),
            });
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }
        if !status.is_success() {
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        let data: YahooQuoteResponse =
            response
                .json()
                .await
                .map_err(|e| MarketDataError::ProviderError {
                    provider: PROVIDER_ID.to_string(),
                    message: format!("Failed to parse quote response: {}", e),
                })?;

        Ok(Some(data.quote_response.result))
    }

    /// Batch request, refreshing the crumb once if it has expired.
    async fn fetch_chunk(&self, tickers: &[String]) -> Result<Vec<YahooQuote>, MarketDataError> {
        let crumb = self.ensure_crumb().await?;
        if let Some(quotes) = self.request_batch(tickers, &crumb).await? {
            return Ok(quotes);
        }

        debug!("Yahoo crumb rejected, refreshing");
        self.store_crumb(None);
        let crumb = self.ensure_crumb().await?;

        match self.request_batch(tickers, &crumb).await? {
            Some(quotes) => Ok(quotes),
            None => {
                self.store_crumb(None);
                Err(MarketDataError::Unauthorized {
                    provider: PROVIDER_ID.to_string(),
                    message: "Yahoo authentication rejected after crumb refresh".to_string(),
                })
            }
        }
    }
}

impl Default for YahooDelayedProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a Yahoo quote to a provider quote. Quotes without a usable
/// price are dropped.
fn to_provider_quote(quote: &YahooQuote) -> Option<ProviderQuote> {
    let last_price = quote
        .regular_market_price
        .and_then(Decimal::from_f64_retain)?;

    let timestamp = quote
        .regular_market_time
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single());

    Some(ProviderQuote {
        last_price,
        change: quote
            .regular_market_change
            .and_then(Decimal::from_f64_retain),
        change_percent: quote
            .regular_market_change_percent
            .and_then(Decimal::from_f64_retain),
        previous_close: quote
            .regular_market_previous_close
            .and_then(Decimal::from_f64_retain),
        volume: quote.regular_market_volume.and_then(Decimal::from_f64),
        timestamp,
    })
}

/// Match returned quotes back to the tickers as requested.
///
/// Yahoo echoes symbols upper-cased, so matching is case-insensitive.
fn collect_quotes(
    requested: &[String],
    quotes: Vec<YahooQuote>,
) -> HashMap<String, ProviderQuote> {
    let by_symbol: HashMap<String, YahooQuote> = quotes
        .into_iter()
        .map(|q| (q.symbol.to_uppercase(), q))
        .collect();

    requested
        .iter()
        .filter_map(|ticker| {
            let quote = by_symbol.get(&ticker.to_uppercase())?;
            match to_provider_quote(quote) {
                Some(converted) => Some((ticker.clone(), converted)),
                None => {
                    warn!("Yahoo returned {} without a usable price", ticker);
                    None
                }
            }
        })
        .collect()
}

// ============================================================================
// DelayedQuoteProvider Implementation
// ============================================================================

#[async_trait]
impl DelayedQuoteProvider for YahooDelayedProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_quotes(
        &self,
        tickers: &[String],
    ) -> Result<HashMap<String, ProviderQuote>, MarketDataError> {
        let mut quotes = HashMap::with_capacity(tickers.len());

        for chunk in tickers.chunks(MAX_TICKERS_PER_REQUEST) {
            debug!("Fetching {} Yahoo quotes", chunk.len());
            let raw = self.fetch_chunk(chunk).await?;
            quotes.extend(collect_quotes(chunk, raw));
        }

        Ok(quotes)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn yahoo_quote(symbol: &str, price: Option<f64>) -> YahooQuote {
        YahooQuote {
            symbol: symbol.to_string(),
            regular_market_price: price,
            regular_market_change: Some(10.0),
            regular_market_change_percent: Some(0.5),
            regular_market_previous_close: Some(1990.0),
            regular_market_volume: Some(1000.0),
            regular_market_time: Some(1_760_000_000),
        }
    }

    #[test]
    fn test_to_provider_quote() {
        let quote = to_provider_quote(&yahoo_quote("TCS.NS", Some(2000.0))).unwrap();
        assert_eq!(quote.last_price, dec!(2000));
        assert_eq!(quote.change, Some(dec!(10)));
        assert_eq!(quote.previous_close, Some(dec!(1990)));
        assert_eq!(quote.volume, Some(dec!(1000)));
        assert_eq!(quote.timestamp.map(|t| t.timestamp()), Some(1_760_000_000));
    }

    #[test]
    fn test_quote_without_price_is_dropped() {
        assert!(to_provider_quote(&yahoo_quote("TCS.NS", None)).is_none());
    }

    #[test]
    fn test_collect_quotes_matches_requested_tickers() {
        let requested = vec![
            "tcs.ns".to_string(),
            "^NSEI".to_string(),
            "MISSING.NS".to_string(),
        ];
        let returned = vec![
            yahoo_quote("TCS.NS", Some(2000.0)),
            yahoo_quote("^NSEI", Some(25000.0)),
            yahoo_quote("UNASKED.NS", Some(1.0)),
        ];

        let quotes = collect_quotes(&requested, returned);

        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes["tcs.ns"].last_price, dec!(2000));
        assert_eq!(quotes["^NSEI"].last_price, dec!(25000));
        assert!(!quotes.contains_key("MISSING.NS"));
    }
}
