//! spendwatch - AI API usage and budget tracker
//!
//! CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use std::process::ExitCode;

use spendwatch::cli::{Cli, Commands};
use spendwatch::core::logging;
use spendwatch::storage::ResolvedConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging; the server defaults to info so startup is visible.
    let default_level = if matches!(cli.command, Some(Commands::Serve(_))) {
        logging::LogLevel::Info
    } else {
        logging::LogLevel::default()
    };
    let log_level = cli
        .log_level
        .as_deref()
        .and_then(logging::LogLevel::from_arg)
        .or_else(|| logging::parse_log_level_from_env().map(logging::LogLevel::from_tracing_level))
        .unwrap_or(default_level);
    let log_format = if cli.json_output {
        logging::LogFormat::Json
    } else {
        logging::parse_log_format_from_env().unwrap_or_default()
    };
    let log_file = logging::parse_log_file_from_env();
    logging::init(log_level, log_format, log_file, cli.verbose);

    let format = cli.effective_format();
    let config = match cli
        .config_overrides()
        .and_then(|overrides| ResolvedConfig::resolve(&overrides))
    {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            let no_color = !spendwatch::util::env::should_use_color(cli.no_color);
            eprintln!(
                "{}",
                spendwatch::render::error::render_error(&e, format, no_color, cli.pretty)
            );
            return ExitCode::from(e.exit_code().as_u8());
        }
    };

    let no_color = config.no_color || !spendwatch::util::env::should_use_color(config.no_color);
    let pretty = config.pretty;

    match spendwatch::cli::run(cli, &config, no_color).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!(
                "{}",
                spendwatch::render::error::render_error(&e, format, no_color, pretty)
            );
            ExitCode::from(e.exit_code().as_u8())
        }
    }
}
