//! `SQLite` implementation of [`UsageStore`].

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::core::alerts::{AlertQuery, AlertRecord, AlertSeverity, NewAlert};
use crate::core::models::{BudgetRecord, NewUsageEvent, ProviderTotals, UsageAggregate};
use crate::core::period::BudgetPeriod;
use crate::core::provider::{Provider, RequestType};
use crate::error::{Result, SpendError};
use crate::storage::UsageStore;
use crate::storage::schema::run_migrations;

/// Usage store backed by a single `SQLite` connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create or open a database at the given path.
    ///
    /// # Errors
    /// Returns an error if the parent directory cannot be created, the database
    /// cannot be opened, or schema migrations fail.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut conn =
            Connection::open(path).map_err(|e| SpendError::storage("open database", e))?;
        conn.busy_timeout(std::time::Duration::from_secs(5))
            .map_err(|e| SpendError::storage("set busy timeout", e))?;

        run_migrations(&mut conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    /// Returns an error if the in-memory database cannot be opened or migrations fail.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()
            .map_err(|e| SpendError::storage("open in-memory database", e))?;

        run_migrations(&mut conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SpendError::storage("lock connection", "connection mutex poisoned"))
    }
}

impl UsageStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn ping(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i32>(0))
            .map_err(|e| SpendError::storage("ping", e))?;
        Ok(())
    }

    fn record_usage(&self, event: &NewUsageEvent) -> Result<i64> {
        let tokens = i64::try_from(event.tokens)
            .map_err(|_| SpendError::invalid_field("tokens", "value too large"))?;
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare_cached(
                "INSERT INTO api_usage \
                    (provider, model, tokens_used, cost, request_type, timestamp, month, year) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .map_err(|e| SpendError::storage("prepare insert usage", e))?;

        stmt.execute(params![
            event.provider.cli_name(),
            event.model,
            tokens,
            event.cost,
            event.request_type.as_str(),
            format_timestamp(event.timestamp),
            event.period.label(),
            event.period.year,
        ])
        .map_err(|e| SpendError::storage("insert usage", e))?;

        Ok(conn.last_insert_rowid())
    }

    fn monthly_totals(
        &self,
        provider: Provider,
        period: BudgetPeriod,
    ) -> Result<Vec<UsageAggregate>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare_cached(
                "SELECT request_type, model, TOTAL(tokens_used), SUM(cost), COUNT(*) \
                 FROM api_usage \
                 WHERE provider = ?1 AND month = ?2 AND year = ?3 \
                 GROUP BY request_type, model \
                 ORDER BY request_type, model",
            )
            .map_err(|e| SpendError::storage("prepare monthly totals", e))?;

        let rows = stmt
            .query_map(
                params![provider.cli_name(), period.label(), period.year],
                |row| {
                    let request_type: String = row.get(0)?;
                    Ok(UsageAggregate {
                        request_type: RequestType::from_arg_lenient(&request_type),
                        model: row.get(1)?,
                        total_tokens: tokens_from_total(row.get(2)?),
                        total_cost: row.get(3)?,
                        request_count: to_u64(row.get(4)?),
                    })
                },
            )
            .map_err(|e| SpendError::storage("query monthly totals", e))?;

        let mut aggregates = Vec::new();
        for row in rows {
            aggregates.push(row.map_err(|e| SpendError::storage("map aggregate row", e))?);
        }
        Ok(aggregates)
    }

    fn provider_totals(&self, provider: Provider, period: BudgetPeriod) -> Result<ProviderTotals> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT TOTAL(tokens_used), COALESCE(SUM(cost), 0.0), COUNT(*) \
             FROM api_usage \
             WHERE provider = ?1 AND month = ?2 AND year = ?3",
            params![provider.cli_name(), period.label(), period.year],
            |row| {
                Ok(ProviderTotals {
                    total_tokens: tokens_from_total(row.get(0)?),
                    total_cost: row.get(1)?,
                    total_requests: to_u64(row.get(2)?),
                })
            },
        )
        .map_err(|e| SpendError::storage("query provider totals", e))
    }

    fn set_limit(
        &self,
        provider: Provider,
        period: BudgetPeriod,
        limit: f64,
        at: DateTime<Utc>,
    ) -> Result<BudgetRecord> {
        let conn = self.conn()?;
        let now = format_timestamp(at);
        conn.execute(
            "INSERT INTO monthly_budgets \
                (provider, month, year, budget_limit, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?5) \
             ON CONFLICT (provider, month, year) DO UPDATE SET \
                budget_limit = excluded.budget_limit, \
                updated_at = excluded.updated_at",
            params![provider.cli_name(), period.label(), period.year, limit, now],
        )
        .map_err(|e| SpendError::storage("upsert budget", e))?;

        select_budget(&conn, provider, period)?
            .ok_or_else(|| SpendError::storage("upsert budget", "row missing after upsert"))
    }

    fn create_budget_if_absent(
        &self,
        provider: Provider,
        period: BudgetPeriod,
        limit: f64,
        at: DateTime<Utc>,
    ) -> Result<Option<BudgetRecord>> {
        let conn = self.conn()?;
        let now = format_timestamp(at);
        let inserted = conn
            .execute(
                "INSERT INTO monthly_budgets \
                    (provider, month, year, budget_limit, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5) \
                 ON CONFLICT (provider, month, year) DO NOTHING",
                params![provider.cli_name(), period.label(), period.year, limit, now],
            )
            .map_err(|e| SpendError::storage("insert budget", e))?;

        if inserted == 0 {
            return Ok(None);
        }
        select_budget(&conn, provider, period)
    }

    fn get_budget(&self, provider: Provider, period: BudgetPeriod) -> Result<Option<BudgetRecord>> {
        let conn = self.conn()?;
        select_budget(&conn, provider, period)
    }

    fn record_alert(&self, alert: &NewAlert) -> Result<i64> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare_cached(
                "INSERT INTO alert_notifications \
                    (provider, alert_type, threshold_percent, current_spend, budget_limit, \
                     message, sent_at, month, year) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )
            .map_err(|e| SpendError::storage("prepare insert alert", e))?;

        stmt.execute(params![
            alert.provider.cli_name(),
            alert.severity.as_str(),
            alert.threshold,
            alert.current_spend,
            alert.budget_limit,
            alert.message,
            format_timestamp(alert.sent_at),
            alert.period.label(),
            alert.period.year,
        ])
        .map_err(|e| SpendError::storage("insert alert", e))?;

        Ok(conn.last_insert_rowid())
    }

    fn list_alerts(&self, query: &AlertQuery) -> Result<Vec<AlertRecord>> {
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, provider, alert_type, threshold_percent, current_spend, \
                        budget_limit, message, sent_at, month, year, is_read \
                 FROM alert_notifications \
                 WHERE (?1 = 0 OR is_read = 0) AND (?2 IS NULL OR provider = ?2) \
                 ORDER BY sent_at DESC, id DESC \
                 LIMIT ?3",
            )
            .map_err(|e| SpendError::storage("prepare list alerts", e))?;

        let rows = stmt
            .query_map(
                params![
                    query.unread_only,
                    query.provider.map(Provider::cli_name),
                    limit
                ],
                map_alert_row,
            )
            .map_err(|e| SpendError::storage("query alerts", e))?;

        let mut alerts = Vec::new();
        for row in rows {
            alerts.push(row.map_err(|e| SpendError::storage("map alert row", e))?);
        }
        Ok(alerts)
    }

    fn unread_alert_count(&self) -> Result<u64> {
        let conn = self.conn()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM alert_notifications WHERE is_read = 0",
                [],
                |row| row.get(0),
            )
            .map_err(|e| SpendError::storage("count unread alerts", e))?;
        Ok(to_u64(count))
    }

    fn last_alert_at(
        &self,
        provider: Provider,
        severity: AlertSeverity,
        period: BudgetPeriod,
    ) -> Result<Option<DateTime<Utc>>> {
        let conn = self.conn()?;
        let latest: Option<String> = conn
            .query_row(
                "SELECT MAX(sent_at) FROM alert_notifications \
                 WHERE provider = ?1 AND alert_type = ?2 AND month = ?3 AND year = ?4",
                params![
                    provider.cli_name(),
                    severity.as_str(),
                    period.label(),
                    period.year
                ],
                |row| row.get(0),
            )
            .map_err(|e| SpendError::storage("query last alert", e))?;

        latest
            .map(|raw| parse_timestamp(&raw).map_err(|e| SpendError::storage("decode sent_at", e)))
            .transpose()
    }

    fn mark_alert_read(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn
            .execute(
                "UPDATE alert_notifications SET is_read = 1 WHERE id = ?1",
                [id],
            )
            .map_err(|e| SpendError::storage("mark alert read", e))?;
        Ok(updated > 0)
    }
}

// =============================================================================
// Row helpers
// =============================================================================

fn select_budget(
    conn: &Connection,
    provider: Provider,
    period: BudgetPeriod,
) -> Result<Option<BudgetRecord>> {
    conn.query_row(
        "SELECT id, provider, month, year, budget_limit, created_at, updated_at \
         FROM monthly_budgets \
         WHERE provider = ?1 AND month = ?2 AND year = ?3",
        params![provider.cli_name(), period.label(), period.year],
        map_budget_row,
    )
    .optional()
    .map_err(|e| SpendError::storage("query budget", e))
}

fn map_budget_row(row: &Row<'_>) -> rusqlite::Result<BudgetRecord> {
    Ok(BudgetRecord {
        id: row.get(0)?,
        provider: provider_column(row, 1)?,
        month: row.get(2)?,
        year: row.get(3)?,
        budget_limit: row.get(4)?,
        created_at: timestamp_column(row, 5)?,
        updated_at: timestamp_column(row, 6)?,
    })
}

fn map_alert_row(row: &Row<'_>) -> rusqlite::Result<AlertRecord> {
    let alert_type: String = row.get(2)?;
    let alert_type = AlertSeverity::parse(&alert_type).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(AlertRecord {
        id: row.get(0)?,
        provider: provider_column(row, 1)?,
        alert_type,
        threshold_percent: row.get(3)?,
        current_spend: row.get(4)?,
        budget_limit: row.get(5)?,
        message: row.get(6)?,
        sent_at: timestamp_column(row, 7)?,
        month: row.get(8)?,
        year: row.get(9)?,
        is_read: row.get(10)?,
    })
}

fn provider_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Provider> {
    let name: String = row.get(idx)?;
    Provider::from_cli_name(&name).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

/// `TOTAL()` sums as a float and never overflows; the cast saturates.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn tokens_from_total(value: f64) -> u64 {
    value.round() as u64
}
