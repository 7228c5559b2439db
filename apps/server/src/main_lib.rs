use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use tradedesk_core::{
    portfolio::{
        pnl::{PnlCalculator, PnlConfig},
        snapshot::{SnapshotService, SnapshotServiceTrait},
        summary::{PortfolioSummaryService, PortfolioSummaryServiceTrait},
    },
    quotes::{QuoteService, QuoteServiceTrait},
};
use tradedesk_market_data::{
    BrokerSession, DelayedQuoteProvider, HttpInstrumentSource, InstrumentResolver, MarketDataAggregator,
    ProviderStatusTable, ResolverConfig, YahooDelayedProvider,
};
use tradedesk_storage_sqlite::{db, SqliteSnapshotRepository};

use crate::config::Config;
use crate::holdings_file::FileHoldingsSource;

pub struct AppState {
    pub quote_service: Arc<dyn QuoteServiceTrait>,
    pub snapshot_service: Arc<dyn SnapshotServiceTrait>,
    pub summary_service: Arc<dyn PortfolioSummaryServiceTrait>,
}

pub fn init_tracing() {
    let log_format = std::env::var("TD_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Instrument files map symbols to broker keys, so they are only wired in
/// when a broker session is attached.
pub fn build_resolver(config: &Config, with_broker: bool) -> InstrumentResolver {
    let resolver_config = ResolverConfig {
        default_exchange: config.default_exchange.clone(),
        ..ResolverConfig::default()
    };
    let resolver = InstrumentResolver::new(resolver_config, Arc::new(ProviderStatusTable::new()));

    if config.instrument_urls.is_empty() {
        tracing::info!("No instrument file URLs configured; resolving from the static alias table only");
        return resolver;
    }
    let exchanges = config.instrument_urls.keys().collect::<Vec<_>>();
    if !with_broker {
        tracing::warn!(
            "Instrument file URLs set for {:?} but no broker session is attached; bulk files are not downloaded",
            exchanges
        );
        return resolver;
    }

    tracing::info!("Bulk instrument files configured for: {:?}", exchanges);
    resolver.with_source(Arc::new(HttpInstrumentSource::new(
        config.instrument_urls.clone(),
    )))
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);
    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer((*pool).clone());
    let snapshot_repository = Arc::new(SqliteSnapshotRepository::new(pool.clone(), writer));

    // No broker session in the headless host: the broker tier is skipped.
    let broker: Option<Arc<dyn BrokerSession>> = None;
    let resolver = Arc::new(build_resolver(config, broker.is_some()));

    let delayed: Arc<dyn DelayedQuoteProvider> = Arc::new(YahooDelayedProvider::new());
    let aggregator =
        MarketDataAggregator::with_providers(resolver, config.aggregator.clone(), broker, Some(delayed));
    tracing::info!(
        "Quote ceiling {} ms (delayed tier {} ms)",
        config.aggregator.overall_ceiling_ms,
        config.aggregator.delayed_timeout_ms
    );

    let quote_service: Arc<dyn QuoteServiceTrait> =
        Arc::new(QuoteService::new(Arc::new(aggregator)));
    let snapshot_service: Arc<dyn SnapshotServiceTrait> = Arc::new(SnapshotService::new(
        snapshot_repository,
        quote_service.clone(),
    ));

    let calculator = PnlCalculator::from_config(&PnlConfig {
        market_timezone: config.market_timezone.clone(),
    })?;
    let summary_service: Arc<dyn PortfolioSummaryServiceTrait> =
        Arc::new(PortfolioSummaryService::new(
            Arc::new(FileHoldingsSource::new(config.holdings_file.clone())),
            quote_service.clone(),
            snapshot_service.clone(),
            calculator,
        ));

    Ok(Arc::new(AppState {
        quote_service,
        snapshot_service,
        summary_service,
    }))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_with_instrument_urls() -> Config {
        let vars = HashMap::from([(
            "TD_INSTRUMENTS_URL_NSE".to_string(),
            "https://example.invalid/NSE.csv".to_string(),
        )]);
        Config::from_vars(&vars).unwrap()
    }

    #[test]
    fn test_instrument_files_need_a_broker_session() {
        let config = config_with_instrument_urls();
        assert!(!config.instrument_urls.is_empty());

        assert!(!build_resolver(&config, false).has_source());
        assert!(build_resolver(&config, true).has_source());
    }

    #[test]
    fn test_resolver_uses_configured_default_exchange() {
        let vars = HashMap::from([("TD_DEFAULT_EXCHANGE".to_string(), "BSE".to_string())]);
        let config = Config::from_vars(&vars).unwrap();

        let resolver = build_resolver(&config, false);

        assert_eq!(resolver.default_exchange(), "BSE");
        assert!(!resolver.has_source());
    }
}
