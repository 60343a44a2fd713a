//! In-process budget scheduler.
//!
//! Runs the monthly reset followed by the budget check on a fixed interval.
//! The first tick fires immediately.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::core::tracker::UsageTracker;

/// Counts from one scheduler pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub budgets_created: usize,
    pub alerts_recorded: usize,
}

/// Run one reset-then-check pass. Failures are logged, never propagated.
pub fn run_tick(tracker: &UsageTracker) -> TickReport {
    let mut report = TickReport::default();

    match tracker.monthly_reset() {
        Ok(outcomes) => {
            report.budgets_created = outcomes.iter().filter(|o| o.action.is_created()).count();
        }
        Err(e) => tracing::error!(error = %e, "Scheduled monthly reset failed"),
    }

    match tracker.evaluate_all() {
        Ok(evaluations) => {
            report.alerts_recorded = evaluations.iter().filter(|e| e.alert_id.is_some()).count();
        }
        Err(e) => tracing::error!(error = %e, "Scheduled budget check failed"),
    }

    report
}

/// Tick until the shutdown channel flips to `true` or its sender drops.
pub async fn budget_tick_loop(
    tracker: Arc<UsageTracker>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    tracing::info!(interval_secs = interval.as_secs(), "Budget scheduler started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        if *shutdown.borrow() {
            break;
        }

        let tracker = Arc::clone(&tracker);
        match tokio::task::spawn_blocking(move || run_tick(&tracker)).await {
            Ok(report) => tracing::debug!(
                budgets_created = report.budgets_created,
                alerts_recorded = report.alerts_recorded,
                "Scheduler tick complete"
            ),
            Err(e) => tracing::error!(error = %e, "Scheduler tick panicked"),
        }
    }

    tracing::info!("Budget scheduler stopped");
}
