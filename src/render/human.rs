//! Human-readable output using `colored`.
//!
//! Renders dashboards, usage reports, and alerts as aligned plain-text blocks
//! with status badges.

use std::fmt::Write as _;

use colored::{ColoredString, Colorize};

use crate::core::alerts::{AlertList, AlertSeverity};
use crate::core::budgets::{BudgetEvaluation, BudgetSnapshot, BudgetStatus};
use crate::core::models::{ProviderSummary, ResetAction, ResetOutcome, TrackedUsage, UsageReport};
use crate::core::period::BudgetPeriod;
use crate::util::format::{format_cost, format_number, format_percent, format_tokens};
use crate::util::time::format_relative_time;

const BAR_WIDTH: usize = 24;

fn paint(text: &str, no_color: bool, style: impl Fn(&str) -> ColoredString) -> String {
    if no_color {
        text.to_string()
    } else {
        style(text).to_string()
    }
}

/// Status badge: `[OK]`, `[WARN]`, `[CRIT]`.
fn status_badge(status: BudgetStatus, no_color: bool) -> String {
    match status {
        BudgetStatus::Normal => paint("[OK]", no_color, |s| s.green().bold()),
        BudgetStatus::Warning => paint("[WARN]", no_color, |s| s.yellow().bold()),
        BudgetStatus::Critical => paint("[CRIT]", no_color, |s| s.red().bold()),
    }
}

/// Usage bar filled in proportion to `percent`, capped at the bar width.
fn usage_bar(percent: f64, status: BudgetStatus, no_color: bool) -> String {
    let ratio = (percent / 100.0).clamp(0.0, 1.0);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let filled = (ratio * BAR_WIDTH as f64).round() as usize;
    let bar = format!(
        "{}{}",
        "\u{2588}".repeat(filled),
        "\u{2591}".repeat(BAR_WIDTH - filled)
    );
    match status {
        BudgetStatus::Normal => paint(&bar, no_color, |s| s.green()),
        BudgetStatus::Warning => paint(&bar, no_color, |s| s.yellow()),
        BudgetStatus::Critical => paint(&bar, no_color, |s| s.red()),
    }
}

fn heading(text: &str, no_color: bool) -> String {
    paint(text, no_color, |s| s.bold().cyan())
}

fn dim(text: &str, no_color: bool) -> String {
    paint(text, no_color, |s| s.dimmed())
}

/// Render the dashboard.
pub fn render_dashboard(rows: &[ProviderSummary], period: BudgetPeriod, no_color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", heading(&format!("Spend for {period}"), no_color));
    out.push('\n');

    for row in rows {
        let _ = writeln!(
            out,
            "{:<8} {} {}",
            row.provider.display_name(),
            status_badge(row.status, no_color),
            usage_bar(row.usage_percent, row.status, no_color),
        );
        let _ = writeln!(
            out,
            "         {} of {} ({}), {} left",
            format_cost(row.total_cost),
            format_cost(row.budget_limit),
            format_percent(row.usage_percent),
            format_cost(row.remaining_budget),
        );
        let _ = writeln!(
            out,
            "         {}",
            dim(
                &format!(
                    "{} tokens across {} requests",
                    format_tokens(row.total_tokens),
                    format_number(row.total_requests)
                ),
                no_color
            )
        );
        out.push('\n');
    }
    out
}

fn render_snapshot_lines(out: &mut String, snapshot: &BudgetSnapshot, no_color: bool) {
    let _ = writeln!(
        out,
        "Budget:    {} {}",
        format_cost(snapshot.budget_limit),
        status_badge(snapshot.status, no_color)
    );
    let _ = writeln!(
        out,
        "Spent:     {} ({})",
        format_cost(snapshot.current_spend),
        format_percent(snapshot.usage_percent)
    );
    let _ = writeln!(out, "Remaining: {}", format_cost(snapshot.remaining_budget));
}

/// Render one provider's budget snapshot.
pub fn render_budget(snapshot: &BudgetSnapshot, no_color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        heading(
            &format!("{} budget for {}", snapshot.provider.display_name(), snapshot.month),
            no_color
        )
    );
    render_snapshot_lines(&mut out, snapshot, no_color);
    out
}

/// Render a usage report with grouped rows.
pub fn render_usage_report(report: &UsageReport, no_color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        heading(
            &format!("{} usage for {}", report.provider.display_name(), report.month),
            no_color
        )
    );

    if report.usage.is_empty() {
        let _ = writeln!(out, "{}", dim("No usage recorded", no_color));
    } else {
        let _ = writeln!(
            out,
            "{:<8} {:<24} {:>12} {:>10} {:>10}",
            "Type", "Model", "Tokens", "Requests", "Cost"
        );
        for row in &report.usage {
            let _ = writeln!(
                out,
                "{:<8} {:<24} {:>12} {:>10} {:>10}",
                row.request_type.as_str(),
                row.model,
                format_number(row.total_tokens),
                format_number(row.request_count),
                format_cost(row.total_cost),
            );
        }
    }
    out.push('\n');
    render_snapshot_lines(&mut out, &report.budget, no_color);
    out
}

/// Render the result of a tracking call.
pub fn render_tracked(tracked: &TrackedUsage, no_color: bool) -> String {
    let mut out = format!(
        "Tracked {} {} tokens on {} ({}) for {} {}\n",
        format_number(tracked.tokens),
        tracked.request_type,
        tracked.provider.display_name(),
        tracked.model,
        format_cost(tracked.cost),
        status_badge(tracked.status, no_color),
    );
    if let Some(id) = tracked.alert_id {
        let _ = writeln!(
            out,
            "{}",
            paint(&format!("Alert #{id} recorded"), no_color, |s| s.yellow())
        );
    }
    out
}

/// Render the alert listing.
pub fn render_alerts(list: &AlertList, no_color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        heading(&format!("Alerts ({} unread)", list.unread_count), no_color)
    );
    if list.alerts.is_empty() {
        let _ = writeln!(out, "{}", dim("No alerts", no_color));
        return out;
    }
    for alert in &list.alerts {
        let marker = if alert.is_read { " " } else { "*" };
        let severity = match alert.alert_type {
            AlertSeverity::Warning => paint("WARNING ", no_color, |s| s.yellow().bold()),
            AlertSeverity::Critical => paint("CRITICAL", no_color, |s| s.red().bold()),
        };
        let _ = writeln!(
            out,
            "{marker} #{:<5} {severity} {:<7} {}",
            alert.id,
            alert.provider.cli_name(),
            dim(&format_relative_time(alert.sent_at), no_color),
        );
        let _ = writeln!(out, "         {}", alert.message);
    }
    out
}

/// Render monthly reset outcomes.
pub fn render_reset(outcomes: &[ResetOutcome], no_color: bool) -> String {
    let mut out = String::new();
    for outcome in outcomes {
        let detail = match &outcome.action {
            ResetAction::AlreadyExists { budget_limit } => {
                dim(&format!("already set to {}", format_cost(*budget_limit)), no_color)
            }
            ResetAction::Created {
                budget_limit,
                carried_from: Some(from),
            } => paint(
                &format!("created at {} (carried from {from})", format_cost(*budget_limit)),
                no_color,
                |s| s.green(),
            ),
            ResetAction::Created {
                budget_limit,
                carried_from: None,
            } => paint(
                &format!("created at {} (default)", format_cost(*budget_limit)),
                no_color,
                |s| s.green(),
            ),
        };
        let _ = writeln!(
            out,
            "{:<8} {} {detail}",
            outcome.provider.display_name(),
            outcome.month
        );
    }
    out
}

/// Render budget check results.
pub fn render_evaluations(evaluations: &[BudgetEvaluation], no_color: bool) -> String {
    let mut out = String::new();
    for evaluation in evaluations {
        let alert = match (evaluation.alert_id, evaluation.alert_suppressed) {
            (Some(id), _) => format!(" alert #{id}"),
            (None, true) => " alert suppressed".to_string(),
            (None, false) => String::new(),
        };
        let _ = writeln!(
            out,
            "{:<8} {} {} of {}{alert}",
            evaluation.provider.display_name(),
            status_badge(evaluation.status, no_color),
            format_cost(evaluation.spend),
            format_cost(evaluation.limit),
        );
    }
    out
}
