//! Core data models.
//!
//! These types are shared by the store, the tracker, the HTTP layer, and the
//! CLI renderers. JSON field names are camelCase throughout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::budgets::{BudgetSnapshot, BudgetStatus};
use crate::core::period::BudgetPeriod;
use crate::core::provider::{Provider, RequestType};

// =============================================================================
// Usage Ledger
// =============================================================================

/// A usage event ready to be appended to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUsageEvent {
    pub provider: Provider,
    pub model: String,
    pub tokens: u64,
    /// USD, derived from the pricing table at tracking time.
    pub cost: f64,
    pub request_type: RequestType,
    pub timestamp: DateTime<Utc>,
    pub period: BudgetPeriod,
}

/// A persisted ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageEvent {
    pub id: i64,
    pub provider: Provider,
    pub model: String,
    pub tokens: u64,
    pub cost: f64,
    pub request_type: RequestType,
    pub timestamp: DateTime<Utc>,
    pub month: String,
    pub year: i32,
}

/// Ledger rows for one provider and period grouped by (request type, model).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageAggregate {
    pub request_type: RequestType,
    pub model: String,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub request_count: u64,
}

/// Ungrouped ledger totals for one provider and period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderTotals {
    pub total_tokens: u64,
    pub total_cost: f64,
    pub total_requests: u64,
}

// =============================================================================
// Budget Store
// =============================================================================

/// Persisted monthly limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRecord {
    pub id: i64,
    pub provider: Provider,
    pub month: String,
    pub year: i32,
    pub budget_limit: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Tracker Results
// =============================================================================

/// Result of a tracked usage request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedUsage {
    pub id: i64,
    pub cost: f64,
    pub tokens: u64,
    pub provider: Provider,
    pub model: String,
    pub request_type: RequestType,
    /// Budget status after this event was recorded.
    pub status: BudgetStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_id: Option<i64>,
}

/// Monthly aggregates plus the budget snapshot for one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    pub provider: Provider,
    pub month: String,
    pub year: i32,
    pub usage: Vec<UsageAggregate>,
    pub budget: BudgetSnapshot,
}

/// One dashboard row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSummary {
    pub provider: Provider,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub total_requests: u64,
    pub budget_limit: f64,
    pub remaining_budget: f64,
    pub usage_percent: f64,
    pub status: BudgetStatus,
}

/// What the monthly reset did for one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ResetAction {
    /// A record for the period already existed; nothing written.
    AlreadyExists { budget_limit: f64 },
    /// A record was created.
    Created {
        budget_limit: f64,
        /// Period the limit was copied from, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        carried_from: Option<String>,
    },
}

impl ResetAction {
    #[must_use]
    pub const fn budget_limit(&self) -> f64 {
        match self {
            Self::AlreadyExists { budget_limit } | Self::Created { budget_limit, .. } => {
                *budget_limit
            }
        }
    }

    #[must_use]
    pub const fn is_created(&self) -> bool {
        matches!(self, Self::Created { .. })
    }
}

/// Per-provider outcome of the monthly reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetOutcome {
    pub provider: Provider,
    pub month: String,
    pub year: i32,
    #[serde(flatten)]
    pub action: ResetAction,
}

// =============================================================================
// Robot Output
// =============================================================================

/// Schema identifier for CLI JSON output.
pub const ROBOT_SCHEMA_VERSION: &str = "spendwatch.v1";

/// Envelope for machine-readable CLI output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotOutput<T> {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub command: String,
    pub data: T,

    #[serde(default)]
    pub errors: Vec<String>,
}

impl<T> RobotOutput<T> {
    /// Create a new robot output envelope.
    pub fn new(command: impl Into<String>, data: T) -> Self {
        Self {
            schema_version: ROBOT_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            command: command.into(),
            data,
            errors: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_action_serializes_tagged() {
        let outcome = ResetOutcome {
            provider: Provider::OpenAI,
            month: "2026-10".to_string(),
            year: 2026,
            action: ResetAction::Created {
                budget_limit: 25.0,
                carried_from: Some("2026-09".to_string()),
            },
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["action"], "created");
        assert_eq!(json["budgetLimit"], 25.0);
        assert_eq!(json["carriedFrom"], "2026-09");
        assert_eq!(json["provider"], "openai");
    }

    #[test]
    fn tracked_usage_omits_missing_alert() {
        let tracked = TrackedUsage {
            id: 1,
            cost: 0.0015,
            tokens: 1000,
            provider: Provider::OpenAI,
            model: "gpt-3.5-turbo".to_string(),
            request_type: RequestType::Input,
            status: BudgetStatus::Normal,
            alert_id: None,
        };
        let json = serde_json::to_value(&tracked).unwrap();
        assert!(json.get("alertId").is_none());
        assert_eq!(json["requestType"], "input");
    }

    #[test]
    fn robot_output_uses_schema_version() {
        let out = RobotOutput::new("dashboard", Vec::<ProviderSummary>::new());
        assert_eq!(out.schema_version, ROBOT_SCHEMA_VERSION);
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["schemaVersion"], "spendwatch.v1");
    }
}
