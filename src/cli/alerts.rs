//! Alerts command implementation.

use crate::cli::args::{AlertsArgs, OutputFormat};
use crate::core::alerts::AlertQuery;
use crate::core::provider::Provider;
use crate::core::tracker::UsageTracker;
use crate::error::Result;
use crate::render;

/// Execute the alerts command.
pub fn execute(
    tracker: &UsageTracker,
    args: &AlertsArgs,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<()> {
    args.validate()?;

    if let Some(id) = args.mark_read {
        tracker.mark_alert_read(id)?;
        tracing::info!(id, "Marked alert as read");
    }

    let mut query = AlertQuery::default().with_limit(args.limit);
    query.unread_only = args.unread;
    query.provider = args
        .provider
        .as_deref()
        .map(Provider::from_cli_name)
        .transpose()?;

    let list = tracker.alerts(&query)?;
    let output = render::render_alerts(&list, format, pretty, no_color)?;
    if format == OutputFormat::Json {
        println!("{output}");
    } else {
        print!("{output}");
    }
    Ok(())
}
