/// Decimal precision for valuation calculations
pub const DECIMAL_PRECISION: u32 = 6;

/// Market timezone used for the trading-day boundary when none is configured
pub const DEFAULT_MARKET_TIMEZONE: &str = "Asia/Kolkata";
