//! Budget alert records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::budgets::BudgetStatus;
use crate::core::period::BudgetPeriod;
use crate::core::provider::Provider;
use crate::error::{Result, SpendError};

/// Default number of alerts returned by a listing.
pub const DEFAULT_ALERT_LIMIT: usize = 50;
/// Upper bound on a single listing.
pub const MAX_ALERT_LIMIT: usize = 500;

/// Severity of a recorded alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

impl AlertSeverity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    /// Severity for an alerting status; `None` for normal.
    #[must_use]
    pub const fn from_status(status: BudgetStatus) -> Option<Self> {
        match status {
            BudgetStatus::Normal => None,
            BudgetStatus::Warning => Some(Self::Warning),
            BudgetStatus::Critical => Some(Self::Critical),
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "warning" => Ok(Self::Warning),
            "critical" => Ok(Self::Critical),
            other => Err(SpendError::storage(
                "decode alert",
                format!("unknown alert severity '{other}'"),
            )),
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An alert ready to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    pub provider: Provider,
    pub severity: AlertSeverity,
    /// Threshold crossed, as a fraction of the limit.
    pub threshold: f64,
    pub current_spend: f64,
    pub budget_limit: f64,
    pub message: String,
    pub sent_at: DateTime<Utc>,
    pub period: BudgetPeriod,
}

impl NewAlert {
    /// Build an alert with the standard message text.
    #[must_use]
    pub fn new(
        provider: Provider,
        severity: AlertSeverity,
        threshold: f64,
        current_spend: f64,
        budget_limit: f64,
        sent_at: DateTime<Utc>,
        period: BudgetPeriod,
    ) -> Self {
        let message = format_alert_message(provider, severity, threshold, current_spend, budget_limit);
        Self {
            provider,
            severity,
            threshold,
            current_spend,
            budget_limit,
            message,
            sent_at,
            period,
        }
    }
}

/// `"{SEVERITY} Alert: {PROVIDER} API usage has reached {pct}% of monthly budget. ..."`
#[must_use]
pub fn format_alert_message(
    provider: Provider,
    severity: AlertSeverity,
    threshold: f64,
    current_spend: f64,
    budget_limit: f64,
) -> String {
    format!(
        "{} Alert: {} API usage has reached {:.1}% of monthly budget. Current spending: ${:.2} / ${:.2}",
        severity.as_str().to_uppercase(),
        provider.alert_label(),
        threshold * 100.0,
        current_spend,
        budget_limit,
    )
}

/// A persisted alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    pub id: i64,
    pub provider: Provider,
    pub alert_type: AlertSeverity,
    pub threshold_percent: f64,
    pub current_spend: f64,
    pub budget_limit: f64,
    pub message: String,
    pub sent_at: DateTime<Utc>,
    pub month: String,
    pub year: i32,
    pub is_read: bool,
}

/// Filters for listing alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertQuery {
    pub limit: usize,
    pub unread_only: bool,
    pub provider: Option<Provider>,
}

impl Default for AlertQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_ALERT_LIMIT,
            unread_only: false,
            provider: None,
        }
    }
}

impl AlertQuery {
    /// Clamp the limit into `1..=MAX_ALERT_LIMIT`.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.clamp(1, MAX_ALERT_LIMIT);
        self
    }

    /// Whether a record passes the non-limit filters.
    #[must_use]
    pub fn matches(&self, alert: &AlertRecord) -> bool {
        (!self.unread_only || !alert.is_read)
            && self.provider.is_none_or(|p| p == alert.provider)
    }
}

/// Alert listing plus the unread count across all alerts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertList {
    pub alerts: Vec<AlertRecord>,
    pub unread_count: u64,
}
