//! Background scheduler for periodic portfolio snapshots.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use tradedesk_core::portfolio::summary::PortfolioSummaryServiceTrait;

/// Starts the background snapshot scheduler.
///
/// Waits `initial_delay`, then records a snapshot every `every`. A failed
/// run is logged and the loop carries on.
pub fn start_snapshot_scheduler(
    summary: Arc<dyn PortfolioSummaryServiceTrait>,
    every: Duration,
    initial_delay: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Snapshot scheduler started ({}s interval)", every.as_secs());

        tokio::time::sleep(initial_delay).await;

        // First tick is immediate.
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            run_scheduled_snapshot(summary.as_ref()).await;
        }
    })
}

async fn run_scheduled_snapshot(summary: &dyn PortfolioSummaryServiceTrait) {
    debug!("Running scheduled portfolio snapshot...");

    match summary.record_snapshot().await {
        Ok(id) => {
            info!("Scheduled snapshot {} recorded", id);
            match summary.day_pnl() {
                Ok(day) => info!(
                    "Day P&L {} ({}%), confidence {:?}",
                    day.amount, day.percent, day.confidence
                ),
                Err(e) => warn!("Could not compute day P&L: {}", e),
            }
        }
        Err(e) => warn!("Scheduled snapshot failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tradedesk_core::errors::{Error, Result};
    use tradedesk_core::portfolio::pnl::DayPnl;
    use tradedesk_core::portfolio::snapshot::SnapshotId;
    use tradedesk_core::portfolio::summary::PortfolioSummary;

    #[derive(Default)]
    struct CountingSummary {
        records: AtomicUsize,
    }

    #[async_trait]
    impl PortfolioSummaryServiceTrait for CountingSummary {
        async fn get_portfolio_summary(&self) -> Result<PortfolioSummary> {
            unimplemented!()
        }

        async fn record_snapshot(&self) -> Result<SnapshotId> {
            let n = self.records.fetch_add(1, Ordering::SeqCst);
            if n == 1 {
                return Err(Error::Repository("holdings file missing".to_string()));
            }
            Ok(SnapshotId::new(n as i64))
        }

        fn day_pnl(&self) -> Result<DayPnl> {
            Ok(DayPnl::insufficient(None))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_keeps_running_after_failure() {
        let summary = Arc::new(CountingSummary::default());
        let handle = start_snapshot_scheduler(
            summary.clone(),
            Duration::from_secs(60),
            Duration::from_secs(10),
        );

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(summary.records.load(Ordering::SeqCst), 0);

        // Runs at 10s, 70s and 130s; the second run fails.
        tokio::time::sleep(Duration::from_secs(130)).await;
        assert_eq!(summary.records.load(Ordering::SeqCst), 3);

        handle.abort();
    }
}
