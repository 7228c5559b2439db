mod config;
mod holdings_file;
mod main_lib;
mod scheduler;

use config::Config;
use main_lib::{build_state, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let config = Config::from_env()?;
    let state = build_state(&config).await?;

    match state.summary_service.get_portfolio_summary().await {
        Ok(summary) => tracing::info!(
            "Portfolio value {} (cash {}), overall P&L {} ({}%), day P&L {} [{:?}]",
            summary.total_value,
            summary.cash_balance,
            summary.overall_pnl.amount,
            summary.overall_pnl.percent,
            summary.day_pnl.amount,
            summary.confidence
        ),
        Err(e) => tracing::warn!("Initial portfolio summary unavailable: {}", e),
    }
    if let Some(latest) = state.snapshot_service.latest_snapshot()? {
        tracing::info!("Latest snapshot {} at {}", latest.id, latest.timestamp);
    }

    let scheduler = scheduler::start_snapshot_scheduler(
        state.summary_service.clone(),
        config.snapshot_interval,
        config.snapshot_initial_delay,
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    scheduler.abort();

    for (provider, exchange, status) in state.quote_service.unavailable_providers() {
        tracing::info!("Provider {} unavailable for {}: {:?}", provider, exchange, status);
    }
    Ok(())
}
