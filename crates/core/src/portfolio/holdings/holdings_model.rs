use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use tradedesk_market_data::Symbol;

use crate::errors::{Result, ValidationError};

/// An open position as held in the trading account.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub symbol: Symbol,
    pub quantity: Decimal,
    pub average_cost: Decimal,
}

impl Position {
    pub fn new(symbol: impl Into<Symbol>, quantity: Decimal, average_cost: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            average_cost,
        }
    }

    /// Σ average cost × quantity for this position.
    pub fn cost_basis(&self) -> Decimal {
        self.average_cost * self.quantity
    }

    pub fn validate(&self) -> Result<()> {
        if self.symbol.is_empty() {
            return Err(ValidationError::MissingField("symbol".to_string()).into());
        }
        if self.quantity.is_sign_negative() {
            return Err(ValidationError::InvalidInput(format!(
                "Quantity for {} must not be negative, got {}",
                self.symbol, self.quantity
            ))
            .into());
        }
        if self.average_cost.is_sign_negative() {
            return Err(ValidationError::InvalidInput(format!(
                "Average cost for {} must not be negative, got {}",
                self.symbol, self.average_cost
            ))
            .into());
        }
        Ok(())
    }
}

/// Current account holdings: open positions plus free cash.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Holdings {
    #[serde(default)]
    pub positions: Vec<Position>,
    #[serde(default)]
    pub cash_balance: Decimal,
}

impl Holdings {
    pub fn new(positions: Vec<Position>, cash_balance: Decimal) -> Self {
        Self {
            positions,
            cash_balance,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for position in &self.positions {
            position.validate()?;
        }
        Ok(())
    }

    /// Distinct symbols in position order.
    pub fn symbols(&self) -> Vec<Symbol> {
        unique_symbols(&self.positions)
    }
}

pub(crate) fn unique_symbols(positions: &[Position]) -> Vec<Symbol> {
    let mut seen = HashSet::with_capacity(positions.len());
    positions
        .iter()
        .filter(|p| seen.insert(p.symbol.clone()))
        .map(|p| p.symbol.clone())
        .collect()
}
