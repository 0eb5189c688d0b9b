use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::info;

use crate::orchestrator::MemeOrchestrator;

/// Run an auto-post cycle every `period` until `shutdown` resolves.
///
/// The first cycle starts immediately. A cycle that overruns the period
/// delays the next tick instead of queueing a burst.
pub async fn run_schedule<F>(orchestrator: &MemeOrchestrator, period: Duration, shutdown: F)
where
    F: std::future::Future<Output = ()>,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("Scheduler shutting down");
                break;
            }
            _ = ticker.tick() => {
                let report = orchestrator.run_cycle().await;
                info!(
                    posted = report.posted(),
                    failed = report.failed(),
                    skipped = report.skipped(),
                    "Scheduled cycle complete"
                );
            }
        }
    }
}
