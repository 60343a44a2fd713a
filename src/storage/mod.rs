//! Persistence for the usage ledger, budget records, and alerts, plus
//! configuration and platform paths.
//!
//! Two backends implement [`UsageStore`]: [`SqliteStore`] (default, durable)
//! and [`MemoryStore`] (process-lifetime only). The backend is chosen once at
//! startup via [`open_store`].

pub mod config;
pub mod memory;
pub mod paths;
pub mod schema;
pub mod sqlite;

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::alerts::{AlertQuery, AlertRecord, AlertSeverity, NewAlert};
use crate::core::models::{BudgetRecord, NewUsageEvent, ProviderTotals, UsageAggregate};
use crate::core::period::BudgetPeriod;
use crate::core::provider::Provider;
use crate::error::{Result, SpendError};

pub use config::{Config, ConfigOverrides, ConfigSource, ConfigSources, ENV_CONFIG, ResolvedConfig};
pub use memory::MemoryStore;
pub use paths::AppPaths;
pub use schema::{SCHEMA_VERSION, run_migrations};
pub use sqlite::SqliteStore;

/// Store backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

impl StorageBackend {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        }
    }

    /// Parse from a config or env value (case-insensitive).
    pub fn from_arg(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "sqlite" | "sql" => Ok(Self::Sqlite),
            "memory" | "mem" | "in-memory" => Ok(Self::Memory),
            other => Err(SpendError::ConfigInvalid {
                key: "storage.backend".to_string(),
                value: other.to_string(),
                message: "expected 'sqlite' or 'memory'".to_string(),
            }),
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger, budget, and alert persistence.
///
/// Every method is a single short unit of work; none spans more than one
/// logical operation. Implementations are synchronous and are driven from
/// async code through `spawn_blocking`.
pub trait UsageStore: Send + Sync {
    /// Backend identifier for logs and health output.
    fn backend_name(&self) -> &'static str;

    /// Cheap liveness check.
    ///
    /// # Errors
    /// Returns an error if the backend cannot serve queries.
    fn ping(&self) -> Result<()>;

    // -------------------------------------------------------------------------
    // Ledger
    // -------------------------------------------------------------------------

    /// Append a usage event and return its id.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    fn record_usage(&self, event: &NewUsageEvent) -> Result<i64>;

    /// Rows for one provider and period grouped by (request type, model).
    ///
    /// # Errors
    /// Returns an error if the read fails.
    fn monthly_totals(&self, provider: Provider, period: BudgetPeriod)
    -> Result<Vec<UsageAggregate>>;

    /// Ungrouped totals for one provider and period.
    ///
    /// # Errors
    /// Returns an error if the read fails.
    fn provider_totals(&self, provider: Provider, period: BudgetPeriod) -> Result<ProviderTotals>;

    /// Total cost for one provider and period; 0 when there are no rows.
    ///
    /// # Errors
    /// Returns an error if the read fails.
    fn period_spend(&self, provider: Provider, period: BudgetPeriod) -> Result<f64> {
        Ok(self.provider_totals(provider, period)?.total_cost)
    }

    // -------------------------------------------------------------------------
    // Budgets
    // -------------------------------------------------------------------------

    /// Insert or replace the limit for (provider, period).
    ///
    /// # Errors
    /// Returns an error if the write fails.
    fn set_limit(
        &self,
        provider: Provider,
        period: BudgetPeriod,
        limit: f64,
        at: DateTime<Utc>,
    ) -> Result<BudgetRecord>;

    /// Insert a limit only when no record exists for (provider, period).
    ///
    /// Returns the created record, or `None` if one already existed.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    fn create_budget_if_absent(
        &self,
        provider: Provider,
        period: BudgetPeriod,
        limit: f64,
        at: DateTime<Utc>,
    ) -> Result<Option<BudgetRecord>>;

    /// # Errors
    /// Returns an error if the read fails.
    fn get_budget(&self, provider: Provider, period: BudgetPeriod) -> Result<Option<BudgetRecord>>;

    // -------------------------------------------------------------------------
    // Alerts
    // -------------------------------------------------------------------------

    /// Append an alert and return its id.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    fn record_alert(&self, alert: &NewAlert) -> Result<i64>;

    /// Alerts matching `query`, newest first.
    ///
    /// # Errors
    /// Returns an error if the read fails.
    fn list_alerts(&self, query: &AlertQuery) -> Result<Vec<AlertRecord>>;

    /// # Errors
    /// Returns an error if the read fails.
    fn unread_alert_count(&self) -> Result<u64>;

    /// Most recent alert time for (provider, severity, period).
    ///
    /// # Errors
    /// Returns an error if the read fails.
    fn last_alert_at(
        &self,
        provider: Provider,
        severity: AlertSeverity,
        period: BudgetPeriod,
    ) -> Result<Option<DateTime<Utc>>>;

    /// Set the read flag. Returns `false` when no alert has that id.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    fn mark_alert_read(&self, id: i64) -> Result<bool>;
}

/// Open the configured backend.
///
/// # Errors
/// Returns an error if the `SQLite` database cannot be opened or migrated.
pub fn open_store(backend: StorageBackend, path: &Path) -> Result<Arc<dyn UsageStore>> {
    let store: Arc<dyn UsageStore> = match backend {
        StorageBackend::Sqlite => Arc::new(SqliteStore::open(path)?),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    };
    tracing::debug!(
        backend = store.backend_name(),
        path = %path.display(),
        "Opened usage store"
    );
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parse() {
        assert_eq!(StorageBackend::from_arg("SQLite").unwrap(), StorageBackend::Sqlite);
        assert_eq!(StorageBackend::from_arg("memory").unwrap(), StorageBackend::Memory);
        assert!(StorageBackend::from_arg("postgres").is_err());
    }

    #[test]
    fn open_memory_store_ignores_path() {
        let store = open_store(StorageBackend::Memory, Path::new("/nonexistent/x.db")).unwrap();
        assert_eq!(store.backend_name(), "memory");
        store.ping().unwrap();
    }

    #[test]
    fn open_sqlite_store_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("usage.db");
        let store = open_store(StorageBackend::Sqlite, &path).unwrap();
        assert_eq!(store.backend_name(), "sqlite");
        assert!(path.exists());
    }
}
