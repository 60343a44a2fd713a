//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::core::period::BudgetPeriod;
use crate::core::provider::{Provider, RequestType};
use crate::error::{Result, SpendError};
use crate::storage::{ConfigOverrides, StorageBackend};

/// spendwatch - track AI API token usage against monthly budgets.
#[derive(Parser, Debug)]
#[command(name = "spendwatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    // === Global flags ===
    /// Output format
    #[arg(long, value_enum, default_value = "human", global = true)]
    pub format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log level
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit JSONL logs to stderr
    #[arg(long, global = true)]
    pub json_output: bool,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// `SQLite` database path
    #[arg(long, value_name = "PATH", global = true)]
    pub db: Option<PathBuf>,

    /// Storage backend (sqlite, memory)
    #[arg(long, value_name = "BACKEND", global = true)]
    pub storage: Option<String>,
}

impl Cli {
    /// Resolve the effective output format.
    #[must_use]
    pub const fn effective_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }

    /// Configuration overrides carried by global flags and `serve` options.
    ///
    /// # Errors
    /// Returns an error for an unknown `--storage` value.
    pub fn config_overrides(&self) -> Result<ConfigOverrides> {
        let (bind, schedule) = match &self.command {
            Some(Commands::Serve(args)) => (args.bind.clone(), args.schedule),
            _ => (None, false),
        };
        Ok(ConfigOverrides {
            config_path: self.config.clone(),
            bind,
            storage: self
                .storage
                .as_deref()
                .map(StorageBackend::from_arg)
                .transpose()?,
            db_path: self.db.clone(),
            schedule,
            pretty: self.pretty,
            no_color: self.no_color,
        })
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    Serve(ServeArgs),

    /// Record a usage event
    Track(TrackArgs),

    /// Show current-month spend for every provider (default command)
    Dashboard,

    /// Show grouped usage for one provider and month
    Usage(UsageArgs),

    /// Show or set monthly budgets
    #[command(subcommand)]
    Budget(BudgetCommand),

    /// List budget alerts
    Alerts(AlertsArgs),

    /// Ensure every provider has a budget for the current month
    Reset,

    /// Evaluate every provider's budget and record alerts
    Check,
}

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address (e.g. 127.0.0.1:3001)
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Run the in-process reset/check scheduler
    #[arg(long)]
    pub schedule: bool,
}

/// Arguments for the `track` command.
#[derive(Args, Debug)]
pub struct TrackArgs {
    /// Provider (openai, gemini)
    pub provider: String,

    /// Model name
    pub model: String,

    /// Token count
    pub tokens: u64,

    /// Request type (input, output)
    #[arg(long, value_name = "TYPE", default_value = "input")]
    pub request_type: String,
}

impl TrackArgs {
    /// # Errors
    /// Returns an error for an unknown provider.
    pub fn provider(&self) -> Result<Provider> {
        Provider::from_cli_name(&self.provider)
    }

    #[must_use]
    pub fn request_type(&self) -> RequestType {
        RequestType::from_arg_lenient(&self.request_type)
    }
}

/// Month selection shared by period-scoped commands.
#[derive(Args, Debug, Default, Clone)]
pub struct PeriodArgs {
    /// Month as YYYY-MM or 1-12 (default: current)
    #[arg(long, value_name = "MONTH")]
    pub month: Option<String>,

    /// Year (default: current)
    #[arg(long, value_name = "YEAR")]
    pub year: Option<i32>,
}

impl PeriodArgs {
    /// # Errors
    /// Returns an error for an invalid or inconsistent month/year.
    pub fn resolve(&self, current: BudgetPeriod) -> Result<BudgetPeriod> {
        BudgetPeriod::resolve(self.month.as_deref(), self.year, current)
    }
}

/// Arguments for the `usage` command.
#[derive(Args, Debug)]
pub struct UsageArgs {
    /// Provider (openai, gemini)
    pub provider: String,

    #[command(flatten)]
    pub period: PeriodArgs,
}

/// Budget subcommands.
#[derive(Subcommand, Debug)]
pub enum BudgetCommand {
    /// Show the budget snapshot for a provider
    Show {
        /// Provider (openai, gemini)
        provider: String,

        #[command(flatten)]
        period: PeriodArgs,
    },

    /// Set the monthly limit for a provider
    Set {
        /// Provider (openai, gemini)
        provider: String,

        /// Limit in USD
        limit: f64,

        #[command(flatten)]
        period: PeriodArgs,
    },
}

/// Arguments for the `alerts` command.
#[derive(Args, Debug)]
pub struct AlertsArgs {
    /// Maximum alerts to show
    #[arg(long, default_value = "50")]
    pub limit: usize,

    /// Only unread alerts
    #[arg(long)]
    pub unread: bool,

    /// Only alerts for this provider
    #[arg(long, value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Mark the alert with this id as read
    #[arg(long, value_name = "ID")]
    pub mark_read: Option<i64>,
}

impl AlertsArgs {
    /// Validate argument combinations.
    ///
    /// # Errors
    /// Returns an error if `--limit` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(SpendError::invalid_field(
                "limit",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    #[default]
    Human,
    /// JSON output
    Json,
    /// Markdown output
    Md,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn json_shorthand_wins() {
        let cli = Cli::parse_from(["spendwatch", "--json", "dashboard"]);
        assert_eq!(cli.effective_format(), OutputFormat::Json);
    }

    #[test]
    fn serve_flags_become_overrides() {
        let cli = Cli::parse_from([
            "spendwatch",
            "serve",
            "--bind",
            "0.0.0.0:9000",
            "--schedule",
            "--storage",
            "memory",
        ]);
        let overrides = cli.config_overrides().unwrap();
        assert_eq!(overrides.bind.as_deref(), Some("0.0.0.0:9000"));
        assert!(overrides.schedule);
        assert_eq!(overrides.storage, Some(StorageBackend::Memory));
    }

    #[test]
    fn unknown_storage_is_rejected() {
        let cli = Cli::parse_from(["spendwatch", "--storage", "redis", "dashboard"]);
        assert!(cli.config_overrides().is_err());
    }

    #[test]
    fn track_parses_request_type() {
        let cli = Cli::parse_from([
            "spendwatch",
            "track",
            "openai",
            "gpt-4",
            "1200",
            "--request-type",
            "output",
        ]);
        let Some(Commands::Track(args)) = cli.command else {
            panic!("expected track");
        };
        assert_eq!(args.provider().unwrap(), Provider::OpenAI);
        assert_eq!(args.request_type(), RequestType::Output);
        assert_eq!(args.tokens, 1200);
    }

    #[test]
    fn alerts_zero_limit_is_invalid() {
        let args = AlertsArgs {
            limit: 0,
            unread: false,
            provider: None,
            mark_read: None,
        };
        assert!(args.validate().is_err());
    }
}
