//! Track command implementation.

use crate::cli::args::{OutputFormat, TrackArgs};
use crate::core::tracker::{UsageRequest, UsageTracker};
use crate::error::Result;
use crate::render;

/// Execute the track command.
pub fn execute(
    tracker: &UsageTracker,
    args: &TrackArgs,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<()> {
    let request = UsageRequest::new(args.provider()?, args.model.trim(), args.tokens)
        .with_request_type(args.request_type());
    let tracked = tracker.track_usage(&request)?;
    let output = render::render_tracked(&tracked, format, pretty, no_color)?;
    if format == OutputFormat::Json {
        println!("{output}");
    } else {
        print!("{output}");
    }
    Ok(())
}
