//! Dashboard, usage, and budget command implementations.

use crate::cli::args::{BudgetCommand, OutputFormat, UsageArgs};
use crate::core::provider::Provider;
use crate::core::tracker::UsageTracker;
use crate::error::Result;
use crate::render;

fn emit(output: &str, format: OutputFormat) {
    if format == OutputFormat::Json {
        println!("{output}");
    } else {
        print!("{output}");
    }
}

/// Execute the dashboard command.
pub fn dashboard(
    tracker: &UsageTracker,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<()> {
    let rows = tracker.dashboard()?;
    let output =
        render::render_dashboard(&rows, tracker.current_period(), format, pretty, no_color)?;
    emit(&output, format);
    Ok(())
}

/// Execute the usage command.
pub fn usage(
    tracker: &UsageTracker,
    args: &UsageArgs,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<()> {
    let provider = Provider::from_cli_name(&args.provider)?;
    let period = args.period.resolve(tracker.current_period())?;
    let report = tracker.usage_report(provider, period)?;
    emit(
        &render::render_usage_report(&report, format, pretty, no_color)?,
        format,
    );
    Ok(())
}

/// Execute a budget subcommand.
pub fn budget(
    tracker: &UsageTracker,
    cmd: &BudgetCommand,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<()> {
    let (provider, period) = match cmd {
        BudgetCommand::Show { provider, period } | BudgetCommand::Set { provider, period, .. } => {
            (
                Provider::from_cli_name(provider)?,
                period.resolve(tracker.current_period())?,
            )
        }
    };

    if let BudgetCommand::Set { limit, .. } = cmd {
        tracker.set_budget(provider, period, *limit)?;
    }

    let snapshot = tracker.budget_snapshot(provider, period)?;
    emit(
        &render::render_budget(&snapshot, format, pretty, no_color)?,
        format,
    );
    Ok(())
}
