//! Test utilities for spendwatch.
//!
//! Shared factories and assertion macros for unit tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_utils::*;
//!
//! let tracker = make_test_tracker();
//! let summary = make_test_summary(Provider::OpenAI, 8.5, 10.0);
//! ```

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::core::alerts::{AlertRecord, AlertSeverity};
use crate::core::budgets::{AlertThresholds, BudgetSnapshot};
use crate::core::models::ProviderSummary;
use crate::core::period::{BudgetPeriod, FixedClock};
use crate::core::pricing::PricingTable;
use crate::core::provider::Provider;
use crate::core::tracker::{TrackerSettings, UsageTracker};
use crate::storage::MemoryStore;

// =============================================================================
// Factories
// =============================================================================

/// Fixed instant used by test data: 2026-10-14 12:00 UTC.
#[must_use]
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap()
}

#[must_use]
pub fn test_period() -> BudgetPeriod {
    BudgetPeriod::from_datetime(test_now())
}

/// Memory-backed tracker pinned to [`test_now`].
#[must_use]
pub fn make_test_tracker() -> UsageTracker {
    UsageTracker::new(
        Arc::new(MemoryStore::new()),
        PricingTable::builtin(),
        TrackerSettings::default(),
    )
    .with_clock(Arc::new(FixedClock::new(test_now())))
}

/// Dashboard row for `spend` of `limit` with default thresholds.
#[must_use]
pub fn make_test_summary(provider: Provider, spend: f64, limit: f64) -> ProviderSummary {
    let snapshot = make_test_snapshot(provider, spend, limit);
    ProviderSummary {
        provider,
        total_tokens: 125_000,
        total_cost: spend,
        total_requests: 42,
        budget_limit: limit,
        remaining_budget: snapshot.remaining_budget,
        usage_percent: snapshot.usage_percent,
        status: snapshot.status,
    }
}

#[must_use]
pub fn make_test_snapshot(provider: Provider, spend: f64, limit: f64) -> BudgetSnapshot {
    BudgetSnapshot::new(
        provider,
        test_period(),
        spend,
        limit,
        &AlertThresholds::default(),
    )
}

#[must_use]
pub fn make_test_alert(id: i64, severity: AlertSeverity) -> AlertRecord {
    let threshold = match severity {
        AlertSeverity::Warning => 0.80,
        AlertSeverity::Critical => 0.95,
    };
    AlertRecord {
        id,
        provider: Provider::OpenAI,
        alert_type: severity,
        threshold_percent: threshold,
        current_spend: 9.6,
        budget_limit: 10.0,
        message: crate::core::alerts::format_alert_message(
            Provider::OpenAI,
            severity,
            threshold,
            9.6,
            10.0,
        ),
        sent_at: test_now(),
        month: test_period().label(),
        year: test_period().year,
        is_read: false,
    }
}

/// Sample config TOML exercising every section.
#[must_use]
pub fn make_test_config_toml() -> String {
    r#"[server]
bind = "127.0.0.1:4100"

[storage]
backend = "memory"

[budgets]
openai = 25.0
gemini = 12.5

[alerts]
warning_threshold = 0.7
critical_threshold = 0.9
cooldown_minutes = 60

[cron]
secret = "file-secret"

[pricing]
default_per_thousand = 0.002

[[pricing.models]]
provider = "openai"
model = "gpt-4o"
input_per_thousand = 0.005
output_per_thousand = 0.015

[output]
color = false
pretty = true
"#
    .to_string()
}

// =============================================================================
// Assertion Macros
// =============================================================================

/// Assert that a string contains a substring.
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            haystack.contains(needle),
            "Expected string to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
}

/// Assert that a string does NOT contain ANSI escape codes.
#[macro_export]
macro_rules! assert_no_ansi_codes {
    ($text:expr) => {
        let text = $text;
        assert!(
            !text.contains('\x1b'),
            "Expected string to NOT contain ANSI escape codes.\n\nActual string:\n{:?}",
            text
        );
    };
}

/// Assert approximate floating point equality.
#[macro_export]
macro_rules! assert_float_eq {
    ($left:expr, $right:expr) => {
        $crate::assert_float_eq!($left, $right, 1e-9)
    };
    ($left:expr, $right:expr, $epsilon:expr) => {
        let left: f64 = $left;
        let right: f64 = $right;
        let epsilon: f64 = $epsilon;
        assert!(
            (left - right).abs() < epsilon,
            "Float equality assertion failed: {} != {} (epsilon: {})",
            left,
            right,
            epsilon
        );
    };
}

// =============================================================================
// Helpers
// =============================================================================

/// Strip ANSI escape codes from a string.
#[must_use]
pub fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            if chars.peek() == Some(&'[') {
                chars.next();
                while let Some(&next) = chars.peek() {
                    chars.next();
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_ansi_removes_sgr() {
        assert_eq!(strip_ansi_codes("\x1b[31mred\x1b[0m text"), "red text");
        assert_eq!(strip_ansi_codes("plain"), "plain");
    }

    #[test]
    fn summary_factory_classifies() {
        let summary = make_test_summary(Provider::OpenAI, 8.5, 10.0);
        assert_eq!(summary.status, crate::core::budgets::BudgetStatus::Warning);
        assert_float_eq!(summary.remaining_budget, 1.5);
    }

    #[test]
    fn test_config_parses() {
        let config: crate::storage::Config = toml::from_str(&make_test_config_toml()).unwrap();
        assert!(config.validate().is_ok());
    }
}
