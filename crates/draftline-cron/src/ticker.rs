// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process poll trigger driven by a cron expression.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use croner::Cron;
use draftline_core::DraftlineError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::scheduler::{PollError, PollRequest, PollScheduler};

pub fn parse_schedule(expr: &str) -> Result<Cron, DraftlineError> {
    expr.parse::<Cron>()
        .map_err(|e| DraftlineError::Config(format!("invalid cron expression `{expr}`: {e}")))
}

/// Delay from `now` until the schedule next fires.
pub fn until_next(schedule: &Cron, now: DateTime<Utc>) -> Option<Duration> {
    let next = schedule.find_next_occurrence(&now, false).ok()?;
    (next - now).to_std().ok()
}

/// Spawns a task that runs `scheduler` on every tick of `schedule` until
/// `cancel` fires.
pub fn spawn_poller(
    scheduler: Arc<PollScheduler>,
    schedule: Cron,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let Some(delay) = until_next(&schedule, Utc::now()) else {
                error!("cron schedule has no upcoming occurrence, poller stopped");
                return;
            };
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("poller stopped");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            match scheduler.run(PollRequest::default()).await {
                Ok(report) => info!(merchants = report.processed, "scheduled poll finished"),
                Err(PollError::Busy) => warn!("scheduled poll skipped, previous run still active"),
                Err(PollError::Failed(e)) => error!(error = %e, "scheduled poll failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn every_five_minutes() {
        let schedule = parse_schedule("*/5 * * * *").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 10, 2, 30).unwrap();
        assert_eq!(until_next(&schedule, now), Some(Duration::from_secs(150)));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_schedule("every minute"), Err(DraftlineError::Config(_))));
    }
}
