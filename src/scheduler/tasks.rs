use std::time::Duration;

use crate::roster::RosterSync;
use crate::scheduler::Scheduler;

const SETTLE_JOB: &str = "roster-sync-after-ready";
const RESYNC_JOB: &str = "roster-resync";

/// Sync the group roster once the session has had `settle_delay` to load
/// its chat list. The delay is empirical, not a readiness guarantee.
pub async fn schedule_sync_after_ready(
    scheduler: &Scheduler,
    roster: RosterSync,
    settle_delay: Duration,
) -> anyhow::Result<()> {
    scheduler
        .add_one_shot_job(settle_delay, SETTLE_JOB, move || {
            let roster = roster.clone();
            Box::pin(async move { roster.sync().await })
        })
        .await
}

/// Periodic re-sync on a cron schedule
pub async fn register_resync(
    scheduler: &Scheduler,
    roster: RosterSync,
    cron_expr: &str,
) -> anyhow::Result<()> {
    scheduler
        .add_cron_job(cron_expr, RESYNC_JOB, move || {
            let roster = roster.clone();
            Box::pin(async move { roster.sync().await })
        })
        .await
}
