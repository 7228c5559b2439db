//! Current positions and cash, as supplied by a holdings source.

mod holdings_model;
mod holdings_traits;

pub use holdings_model::{Holdings, Position};
pub(crate) use holdings_model::unique_symbols;
pub use holdings_traits::HoldingsSourceTrait;
