//! Portfolio summary service: current valuation plus P&L.

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use std::sync::Arc;

use super::PortfolioSummary;
use crate::errors::Result;
use crate::portfolio::holdings::HoldingsSourceTrait;
use crate::portfolio::pnl::{DayPnl, PnlCalculator};
use crate::portfolio::snapshot::{SnapshotId, SnapshotServiceTrait};
use crate::portfolio::valuation::{positions_value, value_positions};
use crate::quotes::QuoteServiceTrait;

#[async_trait]
pub trait PortfolioSummaryServiceTrait: Send + Sync {
    /// Marks current holdings and combines them with snapshot-based day P&L.
    async fn get_portfolio_summary(&self) -> Result<PortfolioSummary>;

    /// Records a snapshot of the current holdings.
    async fn record_snapshot(&self) -> Result<SnapshotId>;

    /// Day P&L from the latest snapshot and the last one before its trading day.
    fn day_pnl(&self) -> Result<DayPnl>;
}

pub struct PortfolioSummaryService {
    holdings_source: Arc<dyn HoldingsSourceTrait>,
    quote_service: Arc<dyn QuoteServiceTrait>,
    snapshot_service: Arc<dyn SnapshotServiceTrait>,
    calculator: PnlCalculator,
}

impl PortfolioSummaryService {
    pub fn new(
        holdings_source: Arc<dyn HoldingsSourceTrait>,
        quote_service: Arc<dyn QuoteServiceTrait>,
        snapshot_service: Arc<dyn SnapshotServiceTrait>,
        calculator: PnlCalculator,
    ) -> Self {
        Self {
            holdings_source,
            quote_service,
            snapshot_service,
            calculator,
        }
    }
}

#[async_trait]
impl PortfolioSummaryServiceTrait for PortfolioSummaryService {
    async fn get_portfolio_summary(&self) -> Result<PortfolioSummary> {
        let holdings = self.holdings_source.get_holdings().await?;
        holdings.validate()?;

        let quotes = self.quote_service.get_quotes(&holdings.symbols()).await;
        let entries = value_positions(&holdings.positions, &quotes);

        let overall_pnl = self.calculator.overall_pnl(&entries);
        let day_pnl = self.day_pnl()?;
        let positions_value = positions_value(&entries);

        let stale_symbols = entries
            .iter()
            .filter(|e| e.stale)
            .map(|e| e.symbol.clone())
            .collect();
        let missing_symbols = entries
            .iter()
            .filter(|e| e.mark_missing)
            .map(|e| e.symbol.clone())
            .collect();

        Ok(PortfolioSummary {
            total_value: holdings.cash_balance + positions_value,
            cash_balance: holdings.cash_balance,
            positions_value,
            overall_pnl,
            confidence: day_pnl.confidence,
            day_pnl,
            stale_symbols,
            missing_symbols,
            as_of: Utc::now(),
        })
    }

    async fn record_snapshot(&self) -> Result<SnapshotId> {
        let holdings = self.holdings_source.get_holdings().await?;
        self.snapshot_service
            .record_snapshot(&holdings.positions, holdings.cash_balance)
            .await
    }

    fn day_pnl(&self) -> Result<DayPnl> {
        let Some(current) = self.snapshot_service.latest_snapshot()? else {
            debug!("No snapshots recorded yet; day P&L unavailable");
            return Ok(DayPnl::insufficient(None));
        };

        let day_start = self.calculator.trading_day_start(current.timestamp);
        let previous = self.snapshot_service.latest_snapshot_before(day_start)?;

        Ok(self
            .calculator
            .day_pnl(previous.as_deref(), Some(current.as_ref())))
    }
}
