//! Reset and check command implementations.
//!
//! These run the same operations as the cron HTTP endpoints, for use from a
//! system crontab.

use crate::cli::args::OutputFormat;
use crate::core::tracker::UsageTracker;
use crate::error::Result;
use crate::render;

/// Execute the reset command.
pub fn reset(
    tracker: &UsageTracker,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<()> {
    let outcomes = tracker.monthly_reset()?;
    let output = render::render_reset(&outcomes, format, pretty, no_color)?;
    if format == OutputFormat::Json {
        println!("{output}");
    } else {
        print!("{output}");
    }
    Ok(())
}

/// Execute the check command.
pub fn check(
    tracker: &UsageTracker,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<()> {
    let evaluations = tracker.evaluate_all()?;
    let output = render::render_evaluations(&evaluations, format, pretty, no_color)?;
    if format == OutputFormat::Json {
        println!("{output}");
    } else {
        print!("{output}");
    }
    Ok(())
}
