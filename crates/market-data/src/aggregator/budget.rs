//! Shared request deadline.

use std::future::Future;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};

use crate::errors::MarketDataError;

/// Overall time budget for one quote request.
///
/// Created once per request and consulted before each tier, so a chain of
/// tiers that each run close to their own timeout still finishes by the
/// overall deadline.
#[derive(Clone, Copy, Debug)]
pub struct Budget {
    deadline: Instant,
}

impl Budget {
    pub fn new(ceiling: Duration) -> Self {
        Self {
            deadline: Instant::now() + ceiling,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Deadline for a tier with its own `timeout`, capped by the budget.
    pub fn tier_deadline(&self, timeout: Duration) -> Instant {
        (Instant::now() + timeout).min(self.deadline)
    }
}

/// Run `future`, turning an elapsed `deadline` into [`MarketDataError::Timeout`].
pub async fn with_deadline<T, F>(
    provider: &str,
    deadline: Instant,
    future: F,
) -> Result<T, MarketDataError>
where
    F: Future<Output = Result<T, MarketDataError>>,
{
    match timeout_at(deadline, future).await {
        Ok(result) => result,
        Err(_) => Err(MarketDataError::Timeout {
            provider: provider.to_string(),
        }),
    }
}
