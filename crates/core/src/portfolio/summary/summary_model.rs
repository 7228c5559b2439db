use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use tradedesk_market_data::Symbol;

use crate::portfolio::pnl::{DayPnl, OverallPnl, PnlConfidence};

/// Point-in-time portfolio view handed to the web layer.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_value: Decimal,
    pub cash_balance: Decimal,
    pub positions_value: Decimal,
    pub overall_pnl: OverallPnl,
    pub day_pnl: DayPnl,
    /// Confidence of the day P&L figure.
    pub confidence: PnlConfidence,
    /// Positions currently marked from cache or at cost.
    pub stale_symbols: Vec<Symbol>,
    /// Positions with no quote at all.
    pub missing_symbols: Vec<Symbol>,
    pub as_of: DateTime<Utc>,
}
