//! Bulk instrument file sources.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::instrument_table::{parse_instrument_csv, InstrumentRecord};
use crate::errors::MarketDataError;

/// Source of bulk instrument files, one per exchange.
#[async_trait]
pub trait InstrumentSource: Send + Sync {
    /// Identifier used for provider status tracking.
    fn id(&self) -> &'static str;

    /// Whether a file is published for this exchange at all.
    fn covers(&self, exchange: &str) -> bool;

    /// Download and parse the file for `exchange`.
    ///
    /// Authorization/permission failures must be reported as
    /// [`MarketDataError::Unauthorized`] so the exchange is not retried.
    async fn fetch(&self, exchange: &str) -> Result<Vec<InstrumentRecord>, MarketDataError>;
}

const SOURCE_ID: &str = "BROKER_INSTRUMENTS";

/// Default HTTP request timeout for instrument files (they are large)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloads broker instrument CSV files over HTTP.
pub struct HttpInstrumentSource {
    client: Client,
    urls: HashMap<String, String>,
}

impl HttpInstrumentSource {
    /// Create a source from an exchange -> URL map.
    pub fn new(urls: HashMap<String, String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        let urls = urls
            .into_iter()
            .map(|(exchange, url)| (exchange.to_uppercase(), url))
            .collect();

        Self { client, urls }
    }
}

#[async_trait]
impl InstrumentSource for HttpInstrumentSource {
    fn id(&self) -> &'static str {
        SOURCE_ID
    }

    fn covers(&self, exchange: &str) -> bool {
        self.urls.contains_key(exchange)
    }

    async fn fetch(&self, exchange: &str) -> Result<Vec<InstrumentRecord>, MarketDataError> {
        let url = self
            .urls
            .get(exchange)
            .ok_or_else(|| MarketDataError::DownloadFailed {
                exchange: exchange.to_string(),
                message: "No instrument file configured".to_string(),
            })?;

        debug!("Downloading instrument file for {} from {}", exchange, url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MarketDataError::from_reqwest(SOURCE_ID, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(MarketDataError::Unauthorized {
                provider: SOURCE_ID.to_string(),
                message: format!("Instrument file for {} returned {}", exchange, status),
            });
        }
        if !status.is_success() {
            return Err(MarketDataError::DownloadFailed {
                exchange: exchange.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| MarketDataError::from_reqwest(SOURCE_ID, e))?;

        parse_instrument_csv(exchange, &body)
    }
}
