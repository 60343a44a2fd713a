//! Core domain: providers, pricing, budgets, alerts, and the usage tracker.

pub mod alerts;
pub mod budgets;
pub mod logging;
pub mod models;
pub mod period;
pub mod pricing;
pub mod provider;
pub mod simulate;
pub mod tracker;

pub use alerts::{AlertList, AlertQuery, AlertRecord, AlertSeverity, NewAlert};
pub use budgets::{AlertThresholds, BudgetEvaluation, BudgetSnapshot, BudgetStatus};
pub use models::{
    BudgetRecord, ProviderSummary, ResetAction, ResetOutcome, RobotOutput, TrackedUsage,
    UsageAggregate, UsageReport,
};
pub use period::{BudgetPeriod, Clock, FixedClock, SystemClock};
pub use pricing::{ModelRate, PricingTable};
pub use provider::{Provider, RequestType};
pub use tracker::{TrackerSettings, UsageRequest, UsageTracker};
