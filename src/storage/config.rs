//! Configuration file loading and resolution.
//!
//! Loads configuration from:
//! - Linux: `~/.config/spendwatch/config.toml`
//! - macOS: `~/Library/Application Support/dev.spendwatch.spendwatch/config.toml`
//! - Windows: `%APPDATA%/spendwatch/config/config.toml`
//!
//! ## Precedence
//!
//! Settings are resolved with the following precedence (highest first):
//! 1. CLI flags
//! 2. Environment variables
//! 3. Config file
//! 4. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `SPENDWATCH_CONFIG`: Override config file path
//! - `SPENDWATCH_BIND`: HTTP listen address (e.g., `0.0.0.0:3001`)
//! - `SPENDWATCH_STORAGE`: Store backend (`sqlite`, `memory`)
//! - `SPENDWATCH_DB_PATH`: `SQLite` database file
//! - `SPENDWATCH_BUDGET_OPENAI` / `SPENDWATCH_BUDGET_GEMINI`: Default monthly limits (USD)
//! - `SPENDWATCH_WARNING_THRESHOLD` / `SPENDWATCH_CRITICAL_THRESHOLD`: Alert ratios
//! - `SPENDWATCH_CRON_SECRET`: Bearer secret for the cron endpoints
//! - `SPENDWATCH_NO_COLOR` or `NO_COLOR`: Disable colors
//! - `SPENDWATCH_PRETTY`: Pretty-print JSON output

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{AppPaths, StorageBackend};
use crate::core::budgets::{AlertThresholds, DEFAULT_CRITICAL_THRESHOLD, DEFAULT_WARNING_THRESHOLD};
use crate::core::pricing::{DEFAULT_RATE_PER_THOUSAND, ModelRate, PricingTable};
use crate::core::provider::Provider;
use crate::error::{Result, SpendError};

// =============================================================================
// Environment Variable Names
// =============================================================================

/// Environment variable to override config file path.
pub const ENV_CONFIG: &str = "SPENDWATCH_CONFIG";
/// Environment variable for the HTTP listen address.
pub const ENV_BIND: &str = "SPENDWATCH_BIND";
/// Environment variable for the store backend.
pub const ENV_STORAGE: &str = "SPENDWATCH_STORAGE";
/// Environment variable for the `SQLite` database path.
pub const ENV_DB_PATH: &str = "SPENDWATCH_DB_PATH";
/// Environment variable for the default `OpenAI` monthly limit.
pub const ENV_BUDGET_OPENAI: &str = "SPENDWATCH_BUDGET_OPENAI";
/// Environment variable for the default Gemini monthly limit.
pub const ENV_BUDGET_GEMINI: &str = "SPENDWATCH_BUDGET_GEMINI";
/// Environment variable for the warning threshold.
pub const ENV_WARNING_THRESHOLD: &str = "SPENDWATCH_WARNING_THRESHOLD";
/// Environment variable for the critical threshold.
pub const ENV_CRITICAL_THRESHOLD: &str = "SPENDWATCH_CRITICAL_THRESHOLD";
/// Environment variable for the cron bearer secret.
pub const ENV_CRON_SECRET: &str = "SPENDWATCH_CRON_SECRET";
/// Environment variable to disable colors.
pub const ENV_NO_COLOR: &str = "SPENDWATCH_NO_COLOR";
/// Standard environment variable to disable colors.
pub const ENV_NO_COLOR_STD: &str = "NO_COLOR";
/// Environment variable for pretty JSON output.
pub const ENV_PRETTY: &str = "SPENDWATCH_PRETTY";

/// Default HTTP listen address.
pub const DEFAULT_BIND: &str = "127.0.0.1:3001";
/// Default scheduler interval (daily).
pub const DEFAULT_INTERVAL_MINUTES: u64 = 1440;
/// Longest accepted alert cooldown (one month).
pub const MAX_COOLDOWN_MINUTES: u64 = 31 * 24 * 60;

// =============================================================================
// Overrides
// =============================================================================

/// Values supplied on the command line, highest precedence.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub bind: Option<String>,
    pub storage: Option<StorageBackend>,
    pub db_path: Option<PathBuf>,
    pub schedule: bool,
    pub pretty: bool,
    pub no_color: bool,
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Default monthly limit per provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetDefaults {
    pub openai: f64,
    pub gemini: f64,
}

impl Default for BudgetDefaults {
    fn default() -> Self {
        Self {
            openai: Provider::OpenAI.builtin_budget(),
            gemini: Provider::Gemini.builtin_budget(),
        }
    }
}

impl BudgetDefaults {
    #[must_use]
    pub const fn get(&self, provider: Provider) -> f64 {
        match provider {
            Provider::OpenAI => self.openai,
            Provider::Gemini => self.gemini,
        }
    }

    fn validate(&self) -> Result<()> {
        for provider in Provider::ALL {
            let limit = self.get(*provider);
            if !limit.is_finite() || limit <= 0.0 {
                return Err(SpendError::ConfigInvalid {
                    key: format!("budgets.{}", provider.cli_name()),
                    value: limit.to_string(),
                    message: "must be a positive number".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Fully resolved configuration after merging CLI, env vars, and config file.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// HTTP listen address.
    pub bind: SocketAddr,
    /// Store backend.
    pub storage: StorageBackend,
    /// `SQLite` database file (unused by the memory backend).
    pub db_path: PathBuf,
    /// Default monthly limits.
    pub budgets: BudgetDefaults,
    /// Alert thresholds.
    pub thresholds: AlertThresholds,
    /// Suppress repeat alerts inside this window (`None` = always alert).
    pub alert_cooldown: Option<chrono::Duration>,
    /// Bearer secret for the cron endpoints.
    pub cron_secret: Option<String>,
    /// Run the in-process scheduler.
    pub schedule_enabled: bool,
    /// Scheduler tick interval.
    pub schedule_interval: Duration,
    /// Pricing table with config rows applied.
    pub pricing: PricingTable,
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
    /// Whether to disable colored output.
    pub no_color: bool,
    /// Config file that was consulted.
    pub config_path: PathBuf,
    /// Source of each setting for debugging.
    pub sources: ConfigSources,
}

/// Tracks the source of each configuration value.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub bind: ConfigSource,
    pub storage: ConfigSource,
    pub db_path: ConfigSource,
    pub budget_openai: ConfigSource,
    pub budget_gemini: ConfigSource,
    pub warning_threshold: ConfigSource,
    pub critical_threshold: ConfigSource,
    pub cron_secret: ConfigSource,
    pub schedule_enabled: ConfigSource,
    pub pretty: ConfigSource,
    pub no_color: ConfigSource,
}

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value from CLI flag.
    Cli,
    /// Value from environment variable.
    Env,
    /// Value from config file.
    ConfigFile,
    /// Built-in default.
    #[default]
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI flag"),
            Self::Env => write!(f, "environment variable"),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

impl ResolvedConfig {
    /// Resolve final configuration from CLI overrides, the process
    /// environment, and the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file exists but is invalid
    /// - Any resolved value is invalid (e.g., thresholds out of order)
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self> {
        let env = |key: &str| std::env::var(key).ok();
        let config_path = Self::config_path(overrides, &env);
        let config = Config::load_from(&config_path)?;
        Self::resolve_with(config, config_path, overrides, &env)
    }

    /// Resolve against an explicit environment lookup.
    ///
    /// # Errors
    /// Returns an error if the merged configuration is invalid.
    pub fn resolve_with(
        config: Config,
        config_path: PathBuf,
        overrides: &ConfigOverrides,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        config.validate()?;
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let mut sources = ConfigSources::default();

        // Server
        let bind_raw = pick(
            overrides.bind.clone(),
            env(ENV_BIND),
            config.server.bind.clone(),
            DEFAULT_BIND.to_string(),
            &mut sources.bind,
        );
        let bind: SocketAddr = bind_raw.trim().parse().map_err(|e| SpendError::ConfigInvalid {
            key: "server.bind".to_string(),
            value: bind_raw.clone(),
            message: format!("{e}"),
        })?;

        // Storage
        let storage = match (overrides.storage, env(ENV_STORAGE), config.storage.backend) {
            (Some(backend), _, _) => {
                sources.storage = ConfigSource::Cli;
                backend
            }
            (None, Some(raw), _) => {
                sources.storage = ConfigSource::Env;
                StorageBackend::from_arg(&raw)?
            }
            (None, None, Some(backend)) => {
                sources.storage = ConfigSource::ConfigFile;
                backend
            }
            (None, None, None) => StorageBackend::default(),
        };
        let db_path = pick(
            overrides.db_path.clone(),
            env(ENV_DB_PATH).map(PathBuf::from),
            config.storage.path.clone(),
            AppPaths::new().usage_db_file(),
            &mut sources.db_path,
        );

        // Budgets
        let budgets = BudgetDefaults {
            openai: pick(
                None,
                parse_env_f64(&env, ENV_BUDGET_OPENAI)?,
                config.budgets.openai,
                Provider::OpenAI.builtin_budget(),
                &mut sources.budget_openai,
            ),
            gemini: pick(
                None,
                parse_env_f64(&env, ENV_BUDGET_GEMINI)?,
                config.budgets.gemini,
                Provider::Gemini.builtin_budget(),
                &mut sources.budget_gemini,
            ),
        };
        budgets.validate()?;

        // Alerts
        let thresholds = AlertThresholds {
            warning: pick(
                None,
                parse_env_f64(&env, ENV_WARNING_THRESHOLD)?,
                config.alerts.warning_threshold,
                DEFAULT_WARNING_THRESHOLD,
                &mut sources.warning_threshold,
            ),
            critical: pick(
                None,
                parse_env_f64(&env, ENV_CRITICAL_THRESHOLD)?,
                config.alerts.critical_threshold,
                DEFAULT_CRITICAL_THRESHOLD,
                &mut sources.critical_threshold,
            ),
        };
        thresholds.validate()?;
        let alert_cooldown = match config.alerts.cooldown_minutes {
            0 => None,
            minutes => i64::try_from(minutes)
                .ok()
                .and_then(chrono::Duration::try_minutes),
        };

        // Cron
        let cron_secret = pick_optional(
            env(ENV_CRON_SECRET),
            config.cron.secret.clone().filter(|s| !s.trim().is_empty()),
            &mut sources.cron_secret,
        );
        let schedule_enabled = if overrides.schedule {
            sources.schedule_enabled = ConfigSource::Cli;
            true
        } else if config.cron.schedule_enabled {
            sources.schedule_enabled = ConfigSource::ConfigFile;
            true
        } else {
            false
        };
        let schedule_interval = Duration::from_secs(config.cron.interval_minutes * 60);

        // Output
        let pretty = resolve_flag(
            overrides.pretty,
            is_env_truthy(&env, ENV_PRETTY),
            config.output.pretty,
            &mut sources.pretty,
        );
        let no_color = resolve_flag(
            overrides.no_color,
            is_env_truthy(&env, ENV_NO_COLOR) || env(ENV_NO_COLOR_STD).is_some(),
            !config.output.color,
            &mut sources.no_color,
        );

        Ok(Self {
            bind,
            storage,
            db_path,
            budgets,
            thresholds,
            alert_cooldown,
            cron_secret,
            schedule_enabled,
            schedule_interval,
            pricing: config.pricing.to_table(),
            pretty,
            no_color,
            config_path,
            sources,
        })
    }

    /// Config file path: CLI flag, then `SPENDWATCH_CONFIG`, then the platform default.
    fn config_path(overrides: &ConfigOverrides, env: &dyn Fn(&str) -> Option<String>) -> PathBuf {
        overrides
            .config_path
            .clone()
            .or_else(|| {
                env(ENV_CONFIG)
                    .filter(|v| !v.trim().is_empty())
                    .map(PathBuf::from)
            })
            .unwrap_or_else(Config::config_path)
    }
}

fn pick<T>(cli: Option<T>, env: Option<T>, file: Option<T>, default: T, source: &mut ConfigSource) -> T {
    if let Some(value) = cli {
        *source = ConfigSource::Cli;
        value
    } else if let Some(value) = env {
        *source = ConfigSource::Env;
        value
    } else if let Some(value) = file {
        *source = ConfigSource::ConfigFile;
        value
    } else {
        *source = ConfigSource::Default;
        default
    }
}

fn pick_optional<T>(env: Option<T>, file: Option<T>, source: &mut ConfigSource) -> Option<T> {
    if env.is_some() {
        *source = ConfigSource::Env;
        env
    } else if file.is_some() {
        *source = ConfigSource::ConfigFile;
        file
    } else {
        *source = ConfigSource::Default;
        None
    }
}

fn resolve_flag(cli: bool, env: bool, file: bool, source: &mut ConfigSource) -> bool {
    *source = if cli {
        ConfigSource::Cli
    } else if env {
        ConfigSource::Env
    } else if file {
        ConfigSource::ConfigFile
    } else {
        ConfigSource::Default
    };
    cli || env || file
}

fn parse_env_f64(env: &dyn Fn(&str) -> Option<String>, key: &str) -> Result<Option<f64>> {
    env(key)
        .map(|raw| {
            raw.trim()
                .parse::<f64>()
                .map_err(|_| SpendError::ConfigInvalid {
                    key: key.to_string(),
                    value: raw.clone(),
                    message: "expected a number".to_string(),
                })
        })
        .transpose()
}

/// Check if an environment variable is set to a truthy value.
fn is_env_truthy(env: &dyn Fn(&str) -> Option<String>, var: &str) -> bool {
    env(var).is_some_and(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

// =============================================================================
// Config File
// =============================================================================

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub budgets: BudgetsConfig,
    pub alerts: AlertsConfig,
    pub cron: CronConfig,
    pub pricing: PricingConfig,
    pub output: OutputConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (e.g., `127.0.0.1:3001`).
    pub bind: Option<String>,
}

/// Store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: Option<StorageBackend>,
    pub path: Option<PathBuf>,
}

/// Default monthly limits (USD) per provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetsConfig {
    pub openai: Option<f64>,
    pub gemini: Option<f64>,
}

/// Alert settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    pub warning_threshold: Option<f64>,
    pub critical_threshold: Option<f64>,
    /// Minutes during which a repeat (provider, severity, month) alert is
    /// suppressed. 0 disables suppression.
    pub cooldown_minutes: u64,
}

/// Monthly reset and daily check settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CronConfig {
    /// Bearer secret required by the cron endpoints.
    pub secret: Option<String>,
    /// Run the in-process scheduler alongside the HTTP server.
    pub schedule_enabled: bool,
    /// Scheduler tick interval in minutes.
    pub interval_minutes: u64,
}

impl Default for CronConfig {
    fn default() -> Self {
        Self {
            secret: None,
            schedule_enabled: false,
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
        }
    }
}

/// Extra pricing rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Fallback rate for unknown models (USD per 1K tokens).
    pub default_per_thousand: f64,
    pub models: Vec<PricingModelConfig>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            default_per_thousand: DEFAULT_RATE_PER_THOUSAND,
            models: Vec::new(),
        }
    }
}

/// One `[[pricing.models]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingModelConfig {
    pub provider: String,
    pub model: String,
    pub input_per_thousand: f64,
    pub output_per_thousand: f64,
}

impl PricingConfig {
    /// Built-in table with these rows layered on top.
    #[must_use]
    pub fn to_table(&self) -> PricingTable {
        let mut table = PricingTable::builtin().with_default_rate(self.default_per_thousand);
        for row in &self.models {
            table.insert(
                &row.provider,
                &row.model,
                ModelRate::new(row.input_per_thousand, row.output_per_thousand),
            );
        }
        table
    }
}

/// Output formatting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Whether to use colors in output.
    pub color: bool,
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            pretty: false,
        }
    }
}

impl Config {
    /// Load configuration from a specific path.
    ///
    /// Returns default config if the file doesn't exist.
    /// Returns error only if the file exists but is invalid.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::debug!(?path, "Loading config file");
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| SpendError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Save configuration to a specific path.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| SpendError::Config(format!("Failed to serialize config: {e}")))?;

        fs::write(path, content)?;
        tracing::debug!(?path, "Config file saved");
        Ok(())
    }

    /// Get the default config file path.
    #[must_use]
    pub fn config_path() -> PathBuf {
        AppPaths::new().config_file()
    }

    /// Validate file-level values.
    ///
    /// Checks that:
    /// - The alert cooldown is at most a month
    /// - The scheduler interval is positive
    /// - Pricing rows name a tracked provider and carry non-negative rates
    ///
    /// # Errors
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<()> {
        if self.alerts.cooldown_minutes > MAX_COOLDOWN_MINUTES {
            return Err(SpendError::ConfigInvalid {
                key: "alerts.cooldown_minutes".to_string(),
                value: self.alerts.cooldown_minutes.to_string(),
                message: format!("must be at most {MAX_COOLDOWN_MINUTES}"),
            });
        }
        if self.cron.interval_minutes == 0 {
            return Err(SpendError::ConfigInvalid {
                key: "cron.interval_minutes".to_string(),
                value: "0".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        let rate_ok = |r: f64| r.is_finite() && r >= 0.0;
        if !rate_ok(self.pricing.default_per_thousand) {
            return Err(SpendError::ConfigInvalid {
                key: "pricing.default_per_thousand".to_string(),
                value: self.pricing.default_per_thousand.to_string(),
                message: "must be a non-negative number".to_string(),
            });
        }
        for row in &self.pricing.models {
            Provider::from_cli_name(&row.provider).map_err(|_| SpendError::ConfigInvalid {
                key: "pricing.models.provider".to_string(),
                value: row.provider.clone(),
                message: "unknown provider".to_string(),
            })?;
            if !rate_ok(row.input_per_thousand) || !rate_ok(row.output_per_thousand) {
                return Err(SpendError::ConfigInvalid {
                    key: format!("pricing.models.{}", row.model),
                    value: format!("{}/{}", row.input_per_thousand, row.output_per_thousand),
                    message: "rates must be non-negative numbers".to_string(),
                });
            }
        }

        Ok(())
    }
}
