//! Budget classification.
//!
//! A provider's spend for the current period is divided by its active limit
//! and the resulting ratio is classified against two thresholds:
//!
//! | ratio                         | status   |
//! |-------------------------------|----------|
//! | `ratio >= critical`           | critical |
//! | `warning <= ratio < critical` | warning  |
//! | otherwise                     | normal   |
//!
//! Status is always derived from the ledger and the budget store; it is never
//! persisted.

use serde::{Deserialize, Serialize};

use crate::core::period::BudgetPeriod;
use crate::core::provider::Provider;
use crate::error::{Result, SpendError};

/// Default warning threshold (fraction of the limit).
pub const DEFAULT_WARNING_THRESHOLD: f64 = 0.80;
/// Default critical threshold (fraction of the limit).
pub const DEFAULT_CRITICAL_THRESHOLD: f64 = 0.95;

// =============================================================================
// Budget Status
// =============================================================================

/// Classification of a spend ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    Normal,
    Warning,
    Critical,
}

impl BudgetStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    /// Whether an alert should be recorded for this status.
    #[must_use]
    pub const fn is_alerting(self) -> bool {
        matches!(self, Self::Warning | Self::Critical)
    }
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Thresholds
// =============================================================================

/// Warning and critical thresholds as fractions of the limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    pub warning: f64,
    pub critical: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            warning: DEFAULT_WARNING_THRESHOLD,
            critical: DEFAULT_CRITICAL_THRESHOLD,
        }
    }
}

impl AlertThresholds {
    /// Build thresholds, requiring `0 < warning < critical <= 1`.
    pub fn new(warning: f64, critical: f64) -> Result<Self> {
        let thresholds = Self { warning, critical };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<()> {
        let in_range = |v: f64| v.is_finite() && v > 0.0 && v <= 1.0;
        if !in_range(self.warning) {
            return Err(SpendError::ConfigInvalid {
                key: "alerts.warning_threshold".to_string(),
                value: self.warning.to_string(),
                message: "must be in (0, 1]".to_string(),
            });
        }
        if !in_range(self.critical) {
            return Err(SpendError::ConfigInvalid {
                key: "alerts.critical_threshold".to_string(),
                value: self.critical.to_string(),
                message: "must be in (0, 1]".to_string(),
            });
        }
        if self.warning >= self.critical {
            return Err(SpendError::ConfigInvalid {
                key: "alerts.warning_threshold".to_string(),
                value: self.warning.to_string(),
                message: format!("must be below critical threshold {}", self.critical),
            });
        }
        Ok(())
    }

    /// Classify a spend ratio, checking the critical threshold first.
    #[must_use]
    pub fn classify(&self, ratio: f64) -> BudgetStatus {
        if ratio >= self.critical {
            BudgetStatus::Critical
        } else if ratio >= self.warning {
            BudgetStatus::Warning
        } else {
            BudgetStatus::Normal
        }
    }

    /// Threshold that triggered an alerting status.
    #[must_use]
    pub const fn threshold_for(&self, status: BudgetStatus) -> Option<f64> {
        match status {
            BudgetStatus::Normal => None,
            BudgetStatus::Warning => Some(self.warning),
            BudgetStatus::Critical => Some(self.critical),
        }
    }
}

/// Spend divided by limit; a non-positive limit counts as fully used.
#[must_use]
pub fn usage_ratio(spend: f64, limit: f64) -> f64 {
    if limit > 0.0 { spend / limit } else { 1.0 }
}

// =============================================================================
// Evaluation Results
// =============================================================================

/// Spend and limit for one provider over one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSnapshot {
    pub provider: Provider,
    pub month: String,
    pub year: i32,
    pub budget_limit: f64,
    pub current_spend: f64,
    pub remaining_budget: f64,
    /// Percent of the limit consumed (0-100+).
    pub usage_percent: f64,
    pub status: BudgetStatus,
}

impl BudgetSnapshot {
    #[must_use]
    pub fn new(
        provider: Provider,
        period: BudgetPeriod,
        spend: f64,
        limit: f64,
        thresholds: &AlertThresholds,
    ) -> Self {
        let ratio = usage_ratio(spend, limit);
        Self {
            provider,
            month: period.label(),
            year: period.year,
            budget_limit: limit,
            current_spend: spend,
            remaining_budget: limit - spend,
            usage_percent: ratio * 100.0,
            status: thresholds.classify(ratio),
        }
    }
}

/// Outcome of evaluating one provider's budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetEvaluation {
    pub provider: Provider,
    pub period: BudgetPeriod,
    pub spend: f64,
    pub limit: f64,
    pub ratio: f64,
    pub remaining: f64,
    pub status: BudgetStatus,
    /// Id of the alert recorded by this evaluation, if any.
    pub alert_id: Option<i64>,
    /// An alert was due but suppressed by the cooldown window.
    #[serde(default)]
    pub alert_suppressed: bool,
}
