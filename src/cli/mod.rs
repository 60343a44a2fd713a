//! CLI argument parsing and command dispatch.

pub mod alerts;
pub mod args;
pub mod cron;
pub mod report;
pub mod serve;
pub mod track;

pub use args::{Cli, Commands, OutputFormat};

use crate::core::tracker::UsageTracker;
use crate::error::Result;
use crate::storage::ResolvedConfig;

/// Dispatch a parsed command against resolved configuration.
///
/// # Errors
/// Returns the command's error; the caller maps it to an exit code.
pub async fn run(cli: Cli, config: &ResolvedConfig, no_color: bool) -> Result<()> {
    let format = cli.effective_format();
    let pretty = config.pretty;

    let tracker = || UsageTracker::from_config(config);

    match cli.command.unwrap_or(Commands::Dashboard) {
        Commands::Serve(_) => serve::execute(config).await,
        Commands::Track(args) => track::execute(&tracker()?, &args, format, pretty, no_color),
        Commands::Dashboard => report::dashboard(&tracker()?, format, pretty, no_color),
        Commands::Usage(args) => report::usage(&tracker()?, &args, format, pretty, no_color),
        Commands::Budget(cmd) => report::budget(&tracker()?, &cmd, format, pretty, no_color),
        Commands::Alerts(args) => alerts::execute(&tracker()?, &args, format, pretty, no_color),
        Commands::Reset => cron::reset(&tracker()?, format, pretty, no_color),
        Commands::Check => cron::check(&tracker()?, format, pretty, no_color),
    }
}
