//! Portfolio valuation, snapshots and P&L.

pub mod holdings;
pub mod pnl;
pub mod snapshot;
pub mod summary;
pub mod valuation;

pub use holdings::{Holdings, HoldingsSourceTrait, Position};
pub use pnl::*;
pub use snapshot::*;
pub use summary::*;
pub use valuation::*;
