//! Robot-mode output (JSON and Markdown).
//!
//! JSON output wraps every payload in a [`RobotOutput`] envelope with a
//! stable schema version.

use std::fmt::Write as _;

use crate::core::alerts::AlertList;
use crate::core::models::{ProviderSummary, RobotOutput, UsageReport};
use crate::error::Result;

/// Render any payload as a JSON envelope for `command`.
pub fn render_json<T: serde::Serialize>(command: &str, data: &T, pretty: bool) -> Result<String> {
    let output = RobotOutput::new(command, data);
    let json = if pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    Ok(json)
}

/// Render the dashboard as a Markdown table.
#[must_use]
pub fn render_dashboard_md(rows: &[ProviderSummary]) -> String {
    let mut out = String::from("| provider | spend | limit | used | remaining | status |\n");
    out.push_str("|---|---|---|---|---|---|\n");
    for row in rows {
        let _ = writeln!(
            out,
            "| {} | {:.2} | {:.2} | {:.1}% | {:.2} | {} |",
            row.provider, row.total_cost, row.budget_limit, row.usage_percent, row.remaining_budget, row.status
        );
    }
    out
}

/// Render a usage report as Markdown.
#[must_use]
pub fn render_usage_md(report: &UsageReport) -> String {
    let mut out = format!("## {} {}\n\n", report.provider, report.month);
    out.push_str("| type | model | tokens | requests | cost |\n");
    out.push_str("|---|---|---|---|---|\n");
    for row in &report.usage {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {:.4} |",
            row.request_type, row.model, row.total_tokens, row.request_count, row.total_cost
        );
    }
    let _ = write!(
        out,
        "\n- budget_limit: {:.2}\n- current_spend: {:.2}\n- status: {}\n",
        report.budget.budget_limit, report.budget.current_spend, report.budget.status
    );
    out
}

/// Render alerts as a Markdown list.
#[must_use]
pub fn render_alerts_md(list: &AlertList) -> String {
    let mut out = format!("## Alerts ({} unread)\n\n", list.unread_count);
    for alert in &list.alerts {
        let _ = writeln!(
            out,
            "- [{}] #{} {} {}: {}",
            if alert.is_read { "x" } else { " " },
            alert.id,
            alert.sent_at.format("%Y-%m-%d %H:%M"),
            alert.alert_type,
            alert.message
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alerts::AlertSeverity;
    use crate::core::models::ROBOT_SCHEMA_VERSION;
    use crate::core::provider::Provider;
    use crate::test_utils::*;
    use crate::assert_contains;

    #[test]
    fn json_envelope_carries_schema() {
        let rows = vec![make_test_summary(Provider::OpenAI, 8.5, 10.0)];
        let json = render_json("dashboard", &rows, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["schemaVersion"], ROBOT_SCHEMA_VERSION);
        assert_eq!(value["command"], "dashboard");
        assert_eq!(value["data"][0]["provider"], "openai");
        assert_eq!(value["data"][0]["status"], "warning");
        assert_eq!(value["errors"], serde_json::json!([]));
    }

    #[test]
    fn pretty_json_is_multiline() {
        let json = render_json("reset", &serde_json::json!({"a": 1}), true).unwrap();
        assert!(json.contains('\n'));
    }

    #[test]
    fn dashboard_md_has_row_per_provider() {
        let rows = vec![
            make_test_summary(Provider::OpenAI, 8.5, 10.0),
            make_test_summary(Provider::Gemini, 1.0, 8.0),
        ];
        let md = render_dashboard_md(&rows);
        assert_contains!(&md, "| openai | 8.50 | 10.00 | 85.0% | 1.50 | warning |");
        assert_eq!(md.lines().count(), 4);
    }

    #[test]
    fn alerts_md_marks_read() {
        let mut alert = make_test_alert(3, AlertSeverity::Warning);
        alert.is_read = true;
        let md = render_alerts_md(&AlertList {
            alerts: vec![alert],
            unread_count: 0,
        });
        assert_contains!(&md, "- [x] #3");
    }
}
