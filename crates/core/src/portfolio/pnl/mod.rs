//! P&L engine: overall unrealized P&L and day-over-day valuation change.

mod pnl_calculator;
mod pnl_model;

pub use pnl_calculator::PnlCalculator;
pub use pnl_model::*;
