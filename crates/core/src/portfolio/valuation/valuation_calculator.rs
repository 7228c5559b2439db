use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;

use tradedesk_market_data::{QuoteOutcome, Symbol};

use crate::constants::DECIMAL_PRECISION;
use crate::portfolio::holdings::Position;
use crate::portfolio::snapshot::SnapshotEntry;

/// Values one position against its quote outcome.
///
/// A cached quote is used as the mark but flagged stale. With no quote at
/// all the position is marked at its average cost and flagged both stale
/// and `mark_missing`, so it contributes zero unrealized P&L rather than a
/// fabricated one.
pub fn value_position(position: &Position, outcome: Option<&QuoteOutcome>) -> SnapshotEntry {
    let quote = outcome.and_then(QuoteOutcome::quote);

    let (mark_price, stale, mark_missing, mark_source) = match quote {
        Some(quote) => (
            quote.last_price,
            quote.stale,
            false,
            Some(quote.source.clone()),
        ),
        None => {
            match outcome {
                Some(QuoteOutcome::SymbolNotFound) => warn!(
                    "Symbol {} is unknown to every provider; marking at average cost",
                    position.symbol
                ),
                _ => debug!(
                    "No quote for {}; marking at average cost",
                    position.symbol
                ),
            }
            (position.average_cost, true, true, None)
        }
    };

    SnapshotEntry {
        symbol: position.symbol.clone(),
        quantity: position.quantity,
        average_cost: position.average_cost,
        mark_price,
        value: (position.quantity * mark_price).round_dp(DECIMAL_PRECISION),
        unrealized_pnl: ((mark_price - position.average_cost) * position.quantity)
            .round_dp(DECIMAL_PRECISION),
        stale,
        mark_missing,
        mark_source,
    }
}

/// Values every position, keeping position order.
pub fn value_positions(
    positions: &[Position],
    quotes: &HashMap<Symbol, QuoteOutcome>,
) -> Vec<SnapshotEntry> {
    positions
        .iter()
        .map(|p| value_position(p, quotes.get(&p.symbol)))
        .collect()
}

/// Sum of entry values.
pub fn positions_value(entries: &[SnapshotEntry]) -> Decimal {
    entries.iter().map(|e| e.value).sum()
}
