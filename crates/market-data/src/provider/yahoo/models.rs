//! Yahoo Finance API response models.
//!
//! Only the batch quote endpoint (`/v7/finance/quote`) is used.

use serde::Deserialize;

/// Response wrapper for the batch quote API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooQuoteResponse {
    pub quote_response: YahooQuoteResult,
}

/// Quote response container
#[derive(Debug, Deserialize)]
pub struct YahooQuoteResult {
    #[serde(default)]
    pub result: Vec<YahooQuote>,
    // Note: error field exists in API but we handle errors via HTTP status/empty results
}

/// One quote in a batch response.
///
/// Unknown tickers are simply absent from `result`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooQuote {
    pub symbol: String,
    pub regular_market_price: Option<f64>,
    pub regular_market_change: Option<f64>,
    pub regular_market_change_percent: Option<f64>,
    pub regular_market_previous_close: Option<f64>,
    pub regular_market_volume: Option<f64>,
    /// Unix seconds
    pub regular_market_time: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_batch_response() {
        let json = r#"{
            "quoteResponse": {
                "result": [
                    {
                        "symbol": "RELIANCE.NS",
                        "quoteType": "EQUITY",
                        "regularMarketPrice": 2950.5,
                        "regularMarketChange": 12.25,
                        "regularMarketChangePercent": 0.4169,
                        "regularMarketPreviousClose": 2938.25,
                        "regularMarketVolume": 4831220,
                        "regularMarketTime": 1760000000
                    },
                    {
                        "symbol": "^NSEI",
                        "regularMarketPrice": 25100.1
                    }
                ],
                "error": null
            }
        }"#;

        let response: YahooQuoteResponse = serde_json::from_str(json).unwrap();
        let result = response.quote_response.result;

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].symbol, "RELIANCE.NS");
        assert_eq!(result[0].regular_market_price, Some(2950.5));
        assert_eq!(result[0].regular_market_volume, Some(4831220.0));
        assert_eq!(result[0].regular_market_time, Some(1760000000));
        assert_eq!(result[1].regular_market_change, None);
    }

    #[test]
    fn test_deserialize_empty_result() {
        let json = r#"{"quoteResponse": {"result": [], "error": null}}"#;
        let response: YahooQuoteResponse = serde_json::from_str(json).unwrap();
        assert!(response.quote_response.result.is_empty());
    }
}
