//! Marks positions against quote outcomes.

pub mod valuation_calculator;

pub use valuation_calculator::*;
