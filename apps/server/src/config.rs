//! Host configuration read from `TD_*` environment variables.

use anyhow::Context;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use tradedesk_market_data::{AggregatorConfig, NSE};

const INSTRUMENT_URL_PREFIX: &str = "TD_INSTRUMENTS_URL_";

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub holdings_file: PathBuf,
    pub snapshot_interval: Duration,
    pub snapshot_initial_delay: Duration,
    pub default_exchange: String,
    /// Exchange -> bulk instrument CSV URL
    pub instrument_urls: HashMap<String, String>,
    pub market_timezone: String,
    pub aggregator: AggregatorConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(&std::env::vars().collect())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> anyhow::Result<Self> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let mut aggregator = AggregatorConfig::default();
        if let Some(ms) = parse_u64(vars, "TD_QUOTE_CEILING_MS")? {
            aggregator.overall_ceiling_ms = ms;
        }
        if let Some(ms) = parse_u64(vars, "TD_BROKER_TIMEOUT_MS")? {
            aggregator.broker_timeout_ms = ms;
        }
        if let Some(ms) = parse_u64(vars, "TD_DELAYED_TIMEOUT_MS")? {
            aggregator.delayed_timeout_ms = ms;
        }

        let snapshot_interval = parse_u64(vars, "TD_SNAPSHOT_INTERVAL_SECS")?.unwrap_or(900);
        if snapshot_interval == 0 {
            anyhow::bail!("TD_SNAPSHOT_INTERVAL_SECS must be greater than zero");
        }
        let snapshot_initial_delay =
            parse_u64(vars, "TD_SNAPSHOT_INITIAL_DELAY_SECS")?.unwrap_or(30);

        let instrument_urls = vars
            .iter()
            .filter_map(|(key, url)| {
                let exchange = key.strip_prefix(INSTRUMENT_URL_PREFIX)?;
                let url = url.trim();
                (!exchange.is_empty() && !url.is_empty())
                    .then(|| (exchange.to_uppercase(), url.to_string()))
            })
            .collect();

        Ok(Self {
            db_path: get("TD_DB_PATH").unwrap_or("./db/tradedesk.db").to_string(),
            holdings_file: PathBuf::from(get("TD_HOLDINGS_FILE").unwrap_or("./holdings.json")),
            snapshot_interval: Duration::from_secs(snapshot_interval),
            snapshot_initial_delay: Duration::from_secs(snapshot_initial_delay),
            default_exchange: get("TD_DEFAULT_EXCHANGE")
                .map(str::to_uppercase)
                .unwrap_or_else(|| NSE.to_string()),
            instrument_urls,
            market_timezone: get("TD_MARKET_TZ")
                .unwrap_or(tradedesk_core::constants::DEFAULT_MARKET_TIMEZONE)
                .to_string(),
            aggregator,
        })
    }
}

fn parse_u64(vars: &HashMap<String, String>, key: &str) -> anyhow::Result<Option<u64>> {
    match vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse::<u64>()
            .map(Some)
            .with_context(|| format!("{} must be a non-negative integer, got '{}'", key, raw)),
        None => Ok(None),
    }
}
