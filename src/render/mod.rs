//! Output rendering for human and robot modes.

pub mod error;
pub mod human;
pub mod robot;

use crate::cli::args::OutputFormat;
use crate::core::alerts::AlertList;
use crate::core::budgets::{BudgetEvaluation, BudgetSnapshot};
use crate::core::models::{ProviderSummary, ResetOutcome, TrackedUsage, UsageReport};
use crate::core::period::BudgetPeriod;
use crate::error::Result;

/// Render the dashboard.
pub fn render_dashboard(
    rows: &[ProviderSummary],
    period: BudgetPeriod,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_dashboard(rows, period, no_color)),
        OutputFormat::Json => robot::render_json("dashboard", &rows, pretty),
        OutputFormat::Md => Ok(robot::render_dashboard_md(rows)),
    }
}

/// Render a usage report.
pub fn render_usage_report(
    report: &UsageReport,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_usage_report(report, no_color)),
        OutputFormat::Json => robot::render_json("usage", report, pretty),
        OutputFormat::Md => Ok(robot::render_usage_md(report)),
    }
}

/// Render a budget snapshot.
pub fn render_budget(
    snapshot: &BudgetSnapshot,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human | OutputFormat::Md => Ok(human::render_budget(
            snapshot,
            no_color || format == OutputFormat::Md,
        )),
        OutputFormat::Json => robot::render_json("budget", snapshot, pretty),
    }
}

/// Render a tracking result.
pub fn render_tracked(
    tracked: &TrackedUsage,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human | OutputFormat::Md => Ok(human::render_tracked(
            tracked,
            no_color || format == OutputFormat::Md,
        )),
        OutputFormat::Json => robot::render_json("track", tracked, pretty),
    }
}

/// Render the alert listing.
pub fn render_alerts(
    list: &AlertList,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_alerts(list, no_color)),
        OutputFormat::Json => robot::render_json("alerts", list, pretty),
        OutputFormat::Md => Ok(robot::render_alerts_md(list)),
    }
}

/// Render monthly reset outcomes.
pub fn render_reset(
    outcomes: &[ResetOutcome],
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human | OutputFormat::Md => Ok(human::render_reset(
            outcomes,
            no_color || format == OutputFormat::Md,
        )),
        OutputFormat::Json => robot::render_json("reset", &outcomes, pretty),
    }
}

/// Render budget check results.
pub fn render_evaluations(
    evaluations: &[BudgetEvaluation],
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human | OutputFormat::Md => Ok(human::render_evaluations(
            evaluations,
            no_color || format == OutputFormat::Md,
        )),
        OutputFormat::Json => robot::render_json("check", &evaluations, pretty),
    }
}
