//! Portfolio summary exposed to the web layer.

mod summary_model;
mod summary_service;

pub use summary_model::PortfolioSummary;
pub use summary_service::{PortfolioSummaryService, PortfolioSummaryServiceTrait};

#[cfg(test)]
mod summary_service_tests;
