//! Usage tracking and budget evaluation.
//!
//! [`UsageTracker`] ties the pricing table, the store, and the alert
//! thresholds together. Every operation is a short sequence of independent
//! store calls; evaluate-then-alert is not transactional, so two concurrent
//! tracking calls that both cross a threshold may each record an alert.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::core::alerts::{AlertList, AlertQuery, AlertSeverity, NewAlert};
use crate::core::budgets::{AlertThresholds, BudgetEvaluation, BudgetSnapshot, usage_ratio};
use crate::core::models::{
    BudgetRecord, NewUsageEvent, ProviderSummary, ResetAction, ResetOutcome, TrackedUsage,
    UsageReport,
};
use crate::core::period::{BudgetPeriod, Clock, SystemClock};
use crate::core::pricing::PricingTable;
use crate::core::provider::{Provider, RequestType};
use crate::error::{Result, SpendError};
use crate::storage::UsageStore;
use crate::storage::config::{BudgetDefaults, ResolvedConfig};

/// Evaluation settings fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct TrackerSettings {
    pub thresholds: AlertThresholds,
    /// Limits used when the store has no record for a period.
    pub default_budgets: BudgetDefaults,
    /// Suppress repeat (provider, severity, period) alerts inside this window.
    pub alert_cooldown: Option<chrono::Duration>,
}

impl From<&ResolvedConfig> for TrackerSettings {
    fn from(config: &ResolvedConfig) -> Self {
        Self {
            thresholds: config.thresholds,
            default_budgets: config.budgets,
            alert_cooldown: config.alert_cooldown,
        }
    }
}

/// Largest token count accepted for a single request.
pub const MAX_TOKENS_PER_REQUEST: u64 = 1_000_000_000_000;

/// A usage event as submitted by a caller, before pricing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRequest {
    pub provider: Provider,
    pub model: String,
    pub tokens: u64,
    pub request_type: RequestType,
}

impl UsageRequest {
    pub fn new(provider: Provider, model: impl Into<String>, tokens: u64) -> Self {
        Self {
            provider,
            model: model.into(),
            tokens,
            request_type: RequestType::Input,
        }
    }

    #[must_use]
    pub const fn with_request_type(mut self, request_type: RequestType) -> Self {
        self.request_type = request_type;
        self
    }

    /// # Errors
    /// Returns an error if `tokens` exceeds [`MAX_TOKENS_PER_REQUEST`].
    pub fn validate(&self) -> Result<()> {
        if self.tokens > MAX_TOKENS_PER_REQUEST {
            return Err(SpendError::invalid_field(
                "tokens",
                format!("must be at most {MAX_TOKENS_PER_REQUEST}"),
            ));
        }
        Ok(())
    }
}

/// Usage tracking, budget evaluation, and dashboard aggregation.
#[derive(Clone)]
pub struct UsageTracker {
    store: Arc<dyn UsageStore>,
    pricing: Arc<PricingTable>,
    settings: TrackerSettings,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for UsageTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageTracker")
            .field("store", &self.store.backend_name())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl UsageTracker {
    pub fn new(store: Arc<dyn UsageStore>, pricing: PricingTable, settings: TrackerSettings) -> Self {
        Self {
            store,
            pricing: Arc::new(pricing),
            settings,
            clock: Arc::new(SystemClock),
        }
    }

    /// Open the configured store and build a tracker over it.
    ///
    /// # Errors
    /// Returns an error if the store cannot be opened or migrated.
    pub fn from_config(config: &ResolvedConfig) -> Result<Self> {
        let store = crate::storage::open_store(config.storage, &config.db_path)?;
        Ok(Self::new(
            store,
            config.pricing.clone(),
            TrackerSettings::from(config),
        ))
    }

    /// Replace the wall clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn store(&self) -> &dyn UsageStore {
        self.store.as_ref()
    }

    #[must_use]
    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    #[must_use]
    pub const fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    /// Calendar month containing "now".
    #[must_use]
    pub fn current_period(&self) -> BudgetPeriod {
        self.clock.current_period()
    }

    // =========================================================================
    // Tracking
    // =========================================================================

    /// Price and record a usage event, then evaluate the provider's budget.
    ///
    /// The ledger write is committed before evaluation. A failure to record
    /// the resulting alert is logged and does not fail the call.
    ///
    /// # Errors
    /// Returns an error if the ledger write or the spend/limit reads fail.
    pub fn track_usage(&self, request: &UsageRequest) -> Result<TrackedUsage> {
        request.validate()?;
        let now = self.clock.now();
        let period = BudgetPeriod::from_datetime(now);
        let cost = self.pricing.cost(
            request.provider.cli_name(),
            &request.model,
            request.tokens,
            request.request_type,
        );

        let id = self.store.record_usage(&NewUsageEvent {
            provider: request.provider,
            model: request.model.clone(),
            tokens: request.tokens,
            cost,
            request_type: request.request_type,
            timestamp: now,
            period,
        })?;
        debug!(
            id,
            provider = %request.provider,
            model = %request.model,
            tokens = request.tokens,
            cost,
            "Recorded usage"
        );

        let mut evaluation = self.assess(request.provider, period)?;
        if let Err(e) = self.raise_alert(&mut evaluation) {
            error!(
                provider = %request.provider,
                error = %e,
                "Failed to record budget alert; usage was still tracked"
            );
        }

        Ok(TrackedUsage {
            id,
            cost,
            tokens: request.tokens,
            provider: request.provider,
            model: request.model.clone(),
            request_type: request.request_type,
            status: evaluation.status,
            alert_id: evaluation.alert_id,
        })
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Evaluate the provider's current-month budget and record an alert when
    /// it lands in warning or critical.
    ///
    /// # Errors
    /// Returns an error if any store read or the alert write fails.
    pub fn evaluate(&self, provider: Provider) -> Result<BudgetEvaluation> {
        let mut evaluation = self.assess(provider, self.current_period())?;
        self.raise_alert(&mut evaluation)?;
        Ok(evaluation)
    }

    /// Evaluate every provider (the daily budget check).
    ///
    /// # Errors
    /// Returns the first evaluation failure.
    pub fn evaluate_all(&self) -> Result<Vec<BudgetEvaluation>> {
        let evaluations = Provider::ALL
            .iter()
            .map(|p| self.evaluate(*p))
            .collect::<Result<Vec<_>>>()?;
        info!(
            alerts = evaluations.iter().filter(|e| e.alert_id.is_some()).count(),
            "Budget check complete"
        );
        Ok(evaluations)
    }

    fn assess(&self, provider: Provider, period: BudgetPeriod) -> Result<BudgetEvaluation> {
        let spend = self.store.period_spend(provider, period)?;
        let limit = self.limit_for(provider, period)?;
        let ratio = usage_ratio(spend, limit);
        Ok(BudgetEvaluation {
            provider,
            period,
            spend,
            limit,
            ratio,
            remaining: limit - spend,
            status: self.settings.thresholds.classify(ratio),
            alert_id: None,
            alert_suppressed: false,
        })
    }

    fn raise_alert(&self, evaluation: &mut BudgetEvaluation) -> Result<()> {
        let Some(severity) = AlertSeverity::from_status(evaluation.status) else {
            return Ok(());
        };
        let Some(threshold) = self.settings.thresholds.threshold_for(evaluation.status) else {
            return Ok(());
        };
        let now = self.clock.now();

        if let Some(window) = self.settings.alert_cooldown {
            let last = self
                .store
                .last_alert_at(evaluation.provider, severity, evaluation.period)?;
            if last.is_some_and(|at| now - at < window) {
                debug!(
                    provider = %evaluation.provider,
                    severity = %severity,
                    "Alert suppressed by cooldown"
                );
                evaluation.alert_suppressed = true;
                return Ok(());
            }
        }

        let alert = NewAlert::new(
            evaluation.provider,
            severity,
            threshold,
            evaluation.spend,
            evaluation.limit,
            now,
            evaluation.period,
        );
        let id = self.store.record_alert(&alert)?;
        warn!(
            alert_id = id,
            provider = %evaluation.provider,
            severity = %severity,
            spend = evaluation.spend,
            limit = evaluation.limit,
            "{}",
            alert.message
        );
        evaluation.alert_id = Some(id);
        Ok(())
    }

    // =========================================================================
    // Budgets
    // =========================================================================

    /// Active limit: the stored record, else the configured default.
    ///
    /// # Errors
    /// Returns an error if the budget read fails.
    pub fn limit_for(&self, provider: Provider, period: BudgetPeriod) -> Result<f64> {
        Ok(self
            .store
            .get_budget(provider, period)?
            .map_or_else(|| self.settings.default_budgets.get(provider), |b| b.budget_limit))
    }

    /// Spend, limit, and status for one provider and period.
    ///
    /// # Errors
    /// Returns an error if a store read fails.
    pub fn budget_snapshot(&self, provider: Provider, period: BudgetPeriod) -> Result<BudgetSnapshot> {
        let spend = self.store.period_spend(provider, period)?;
        let limit = self.limit_for(provider, period)?;
        Ok(BudgetSnapshot::new(
            provider,
            period,
            spend,
            limit,
            &self.settings.thresholds,
        ))
    }

    /// Set the limit for (provider, period).
    ///
    /// # Errors
    /// Returns a validation error unless `limit` is positive and finite, or a
    /// storage error if the write fails.
    pub fn set_budget(
        &self,
        provider: Provider,
        period: BudgetPeriod,
        limit: f64,
    ) -> Result<BudgetRecord> {
        if !limit.is_finite() || limit <= 0.0 {
            return Err(SpendError::invalid_field(
                "budgetLimit",
                "must be a positive number",
            ));
        }
        let record = self
            .store
            .set_limit(provider, period, limit, self.clock.now())?;
        info!(provider = %provider, period = %period, limit, "Budget updated");
        Ok(record)
    }

    /// Ensure every provider has a budget record for the current month.
    ///
    /// Existing records are left alone. New records copy the previous month's
    /// limit, falling back to the configured default.
    ///
    /// # Errors
    /// Returns an error if a store read or write fails.
    pub fn monthly_reset(&self) -> Result<Vec<ResetOutcome>> {
        let now = self.clock.now();
        let period = BudgetPeriod::from_datetime(now);
        let mut outcomes = Vec::with_capacity(Provider::ALL.len());

        for provider in Provider::ALL {
            let action = self.reset_provider(*provider, period, now)?;
            if action.is_created() {
                info!(
                    provider = %provider,
                    period = %period,
                    limit = action.budget_limit(),
                    "Created monthly budget"
                );
            }
            outcomes.push(ResetOutcome {
                provider: *provider,
                month: period.label(),
                year: period.year,
                action,
            });
        }
        Ok(outcomes)
    }

    fn reset_provider(
        &self,
        provider: Provider,
        period: BudgetPeriod,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<ResetAction> {
        if let Some(existing) = self.store.get_budget(provider, period)? {
            return Ok(ResetAction::AlreadyExists {
                budget_limit: existing.budget_limit,
            });
        }

        let previous = period.previous();
        let (limit, carried_from) = match self.store.get_budget(provider, previous)? {
            Some(record) => (record.budget_limit, Some(previous.label())),
            None => (self.settings.default_budgets.get(provider), None),
        };

        match self
            .store
            .create_budget_if_absent(provider, period, limit, now)?
        {
            Some(record) => Ok(ResetAction::Created {
                budget_limit: record.budget_limit,
                carried_from,
            }),
            // Lost a race with another reset; report what is there now.
            None => {
                let limit = self.limit_for(provider, period)?;
                Ok(ResetAction::AlreadyExists {
                    budget_limit: limit,
                })
            }
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Grouped usage plus the budget snapshot for one provider and period.
    ///
    /// # Errors
    /// Returns an error if a store read fails.
    pub fn usage_report(&self, provider: Provider, period: BudgetPeriod) -> Result<UsageReport> {
        let usage = self.store.monthly_totals(provider, period)?;
        let budget = self.budget_snapshot(provider, period)?;
        Ok(UsageReport {
            provider,
            month: period.label(),
            year: period.year,
            usage,
            budget,
        })
    }

    /// One summary per provider for the current month, in fixed order.
    ///
    /// # Errors
    /// Returns an error if a store read fails.
    pub fn dashboard(&self) -> Result<Vec<ProviderSummary>> {
        let period = self.current_period();
        Provider::ALL
            .iter()
            .map(|provider| {
                let totals = self.store.provider_totals(*provider, period)?;
                let limit = self.limit_for(*provider, period)?;
                let snapshot = BudgetSnapshot::new(
                    *provider,
                    period,
                    totals.total_cost,
                    limit,
                    &self.settings.thresholds,
                );
                Ok(ProviderSummary {
                    provider: *provider,
                    total_tokens: totals.total_tokens,
                    total_cost: totals.total_cost,
                    total_requests: totals.total_requests,
                    budget_limit: limit,
                    remaining_budget: snapshot.remaining_budget,
                    usage_percent: snapshot.usage_percent,
                    status: snapshot.status,
                })
            })
            .collect()
    }

    /// Recent alerts plus the overall unread count.
    ///
    /// # Errors
    /// Returns an error if a store read fails.
    pub fn alerts(&self, query: &AlertQuery) -> Result<AlertList> {
        Ok(AlertList {
            alerts: self.store.list_alerts(query)?,
            unread_count: self.store.unread_alert_count()?,
        })
    }

    /// # Errors
    /// Returns [`SpendError::AlertNotFound`] for an unknown id.
    pub fn mark_alert_read(&self, id: i64) -> Result<()> {
        if self.store.mark_alert_read(id)? {
            Ok(())
        } else {
            Err(SpendError::AlertNotFound(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alerts::AlertRecord;
    use crate::core::budgets::BudgetStatus;
    use crate::core::models::{ProviderTotals, UsageAggregate};
    use crate::core::period::FixedClock;
    use crate::storage::MemoryStore;
    use chrono::{DateTime, Duration, Utc};
    use tracing_test::traced_test;

    fn tracker_at(clock: Arc<FixedClock>) -> (UsageTracker, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let tracker = UsageTracker::new(
            store.clone(),
            PricingTable::builtin(),
            TrackerSettings::default(),
        )
        .with_clock(clock);
        (tracker, store)
    }

    fn tracker() -> (UsageTracker, Arc<MemoryStore>) {
        tracker_at(Arc::new(FixedClock::at(2026, 10, 14)))
    }

    /// 1,000,000 gpt-4 input tokens cost exactly $30.
    fn spend(tracker: &UsageTracker, dollars: u64) {
        let tokens = dollars * 1000 / 30 * 1000;
        tracker
            .track_usage(&UsageRequest::new(Provider::OpenAI, "gpt-4", tokens))
            .unwrap();
    }

    #[test]
    fn small_usage_is_normal_without_alert() {
        let (tracker, store) = tracker();
        let tracked = tracker
            .track_usage(&UsageRequest::new(Provider::OpenAI, "gpt-3.5-turbo", 1000))
            .unwrap();
        assert!((tracked.cost - 0.0015).abs() < 1e-12);
        assert_eq!(tracked.status, BudgetStatus::Normal);
        assert!(tracked.alert_id.is_none());
        assert!(store.list_alerts(&AlertQuery::default()).unwrap().is_empty());
    }

    #[test]
    fn record_increases_spend_by_cost() {
        let (tracker, store) = tracker();
        let period = tracker.current_period();
        let before = store.period_spend(Provider::Gemini, period).unwrap();
        let tracked = tracker
            .track_usage(
                &UsageRequest::new(Provider::Gemini, "gemini-pro", 4000)
                    .with_request_type(RequestType::Output),
            )
            .unwrap();
        let after = store.period_spend(Provider::Gemini, period).unwrap();
        assert!((after - before - tracked.cost).abs() < 1e-12);
        assert!((tracked.cost - 0.0015).abs() < 1e-12);
    }

    #[test]
    fn warning_at_eight_fifty_of_ten() {
        let (tracker, store) = tracker();
        // 283,334 gpt-4 input tokens is just over $8.50
        let tracked = tracker
            .track_usage(&UsageRequest::new(Provider::OpenAI, "gpt-4", 283_334))
            .unwrap();
        assert_eq!(tracked.status, BudgetStatus::Warning);
        assert!(tracked.alert_id.is_some());

        let alerts = store.list_alerts(&AlertQuery::default()).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertSeverity::Warning);
        assert!((alerts[0].threshold_percent - 0.80).abs() < f64::EPSILON);
        assert!(alerts[0].message.contains("80.0%"));
        assert!(alerts[0].message.contains("/ $10.00"));
    }

    #[test]
    fn critical_at_nine_sixty_of_ten() {
        let (tracker, store) = tracker();
        tracker
            .track_usage(&UsageRequest::new(Provider::OpenAI, "gpt-4", 320_000))
            .unwrap();
        let evaluation = tracker.evaluate(Provider::OpenAI).unwrap();
        assert!((evaluation.spend - 9.6).abs() < 1e-9);
        assert_eq!(evaluation.status, BudgetStatus::Critical);
        assert!(evaluation.alert_id.is_some());

        let criticals: Vec<AlertRecord> = store
            .list_alerts(&AlertQuery::default())
            .unwrap()
            .into_iter()
            .filter(|a| a.alert_type == AlertSeverity::Critical)
            .collect();
        // One from the tracking call, one from the explicit evaluation.
        assert_eq!(criticals.len(), 2);
        assert!((criticals[0].threshold_percent - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn exact_threshold_boundaries() {
        let (tracker, _store) = tracker();
        let period = tracker.current_period();
        tracker.set_budget(Provider::OpenAI, period, 30.0).unwrap();

        // 800k gpt-4 input tokens = $24 = 0.80 of $30
        tracker
            .track_usage(&UsageRequest::new(Provider::OpenAI, "gpt-4", 800_000))
            .unwrap();
        assert_eq!(
            tracker.evaluate(Provider::OpenAI).unwrap().status,
            BudgetStatus::Warning
        );

        // +150k = $28.50 = 0.95 of $30
        tracker
            .track_usage(&UsageRequest::new(Provider::OpenAI, "gpt-4", 150_000))
            .unwrap();
        assert_eq!(
            tracker.evaluate(Provider::OpenAI).unwrap().status,
            BudgetStatus::Critical
        );
    }

    #[traced_test]
    #[test]
    fn alert_is_logged_at_warn() {
        let (tracker, _store) = tracker();
        spend(&tracker, 9);
        assert!(logs_contain("WARN"));
        assert!(logs_contain("WARNING Alert: OPENAI API usage has reached 80.0%"));
        assert!(logs_contain("severity=warning"));
    }

    #[test]
    fn repeated_evaluations_repeat_alerts_by_default() {
        let (tracker, store) = tracker();
        spend(&tracker, 9);
        let before = store.list_alerts(&AlertQuery::default()).unwrap().len();
        tracker.evaluate(Provider::OpenAI).unwrap();
        tracker.evaluate(Provider::OpenAI).unwrap();
        let after = store.list_alerts(&AlertQuery::default()).unwrap().len();
        assert_eq!(after, before + 2);
    }

    #[test]
    fn cooldown_suppresses_repeat_alerts() {
        let clock = Arc::new(FixedClock::at(2026, 10, 14));
        let store = Arc::new(MemoryStore::new());
        let settings = TrackerSettings {
            alert_cooldown: Some(Duration::minutes(30)),
            ..TrackerSettings::default()
        };
        let tracker = UsageTracker::new(store.clone(), PricingTable::builtin(), settings)
            .with_clock(clock.clone());

        spend(&tracker, 9);
        let second = tracker.evaluate(Provider::OpenAI).unwrap();
        assert!(second.alert_id.is_none());
        assert!(second.alert_suppressed);

        clock.advance(Duration::minutes(31));
        let third = tracker.evaluate(Provider::OpenAI).unwrap();
        assert!(third.alert_id.is_some());
        assert_eq!(store.list_alerts(&AlertQuery::default()).unwrap().len(), 2);
    }

    #[test]
    fn limit_falls_back_to_default_then_store() {
        let (tracker, _store) = tracker();
        let period = tracker.current_period();
        assert!((tracker.limit_for(Provider::Gemini, period).unwrap() - 8.0).abs() < f64::EPSILON);
        tracker.set_budget(Provider::Gemini, period, 20.0).unwrap();
        assert!((tracker.limit_for(Provider::Gemini, period).unwrap() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn oversized_tokens_are_rejected_before_recording() {
        let (tracker, store) = tracker();
        for tokens in [u64::MAX, MAX_TOKENS_PER_REQUEST + 1] {
            let err = tracker
                .track_usage(&UsageRequest::new(Provider::OpenAI, "gpt-4", tokens))
                .unwrap_err();
            assert!(matches!(err, SpendError::InvalidField { ref field, .. } if field == "tokens"));
        }
        assert_eq!(
            store
                .provider_totals(Provider::OpenAI, tracker.current_period())
                .unwrap()
                .total_requests,
            0
        );

        tracker
            .track_usage(&UsageRequest::new(Provider::OpenAI, "gpt-4", MAX_TOKENS_PER_REQUEST))
            .unwrap();
        tracker
            .track_usage(&UsageRequest::new(Provider::OpenAI, "gpt-4", 1))
            .unwrap();
        let rows = tracker.dashboard().unwrap();
        assert_eq!(rows[0].total_tokens, MAX_TOKENS_PER_REQUEST + 1);
        assert_eq!(rows[0].status, BudgetStatus::Critical);
        assert!(rows[0].remaining_budget < 0.0);
    }

    #[test]
    fn set_budget_rejects_non_positive() {
        let (tracker, _store) = tracker();
        let period = tracker.current_period();
        for bad in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let err = tracker.set_budget(Provider::OpenAI, period, bad).unwrap_err();
            assert!(matches!(err, SpendError::InvalidField { .. }));
        }
    }

    #[test]
    fn raising_limit_lowers_status() {
        let (tracker, _store) = tracker();
        spend(&tracker, 9);
        let period = tracker.current_period();
        assert_eq!(
            tracker.budget_snapshot(Provider::OpenAI, period).unwrap().status,
            BudgetStatus::Warning
        );
        tracker.set_budget(Provider::OpenAI, period, 100.0).unwrap();
        assert_eq!(
            tracker.budget_snapshot(Provider::OpenAI, period).unwrap().status,
            BudgetStatus::Normal
        );
    }

    #[test]
    fn dashboard_is_fixed_order_and_zero_filled() {
        let (tracker, _store) = tracker();
        tracker
            .track_usage(&UsageRequest::new(Provider::Gemini, "gemini-pro", 8000))
            .unwrap();
        let rows = tracker.dashboard().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].provider, Provider::OpenAI);
        assert_eq!(rows[0].total_requests, 0);
        assert!(rows[0].total_cost.abs() < f64::EPSILON);
        assert!((rows[0].remaining_budget - 10.0).abs() < f64::EPSILON);
        assert_eq!(rows[0].status, BudgetStatus::Normal);
        assert_eq!(rows[1].provider, Provider::Gemini);
        assert_eq!(rows[1].total_tokens, 8000);
        assert_eq!(rows[1].total_requests, 1);
    }

    #[test]
    fn dashboard_ignores_previous_month() {
        let clock = Arc::new(FixedClock::at(2026, 9, 30));
        let (tracker, _store) = tracker_at(clock.clone());
        spend(&tracker, 5);
        clock.advance(Duration::days(1));
        let rows = tracker.dashboard().unwrap();
        assert_eq!(rows[0].total_requests, 0);
    }

    #[test]
    fn usage_report_for_requested_period() {
        let clock = Arc::new(FixedClock::at(2026, 9, 15));
        let (tracker, _store) = tracker_at(clock.clone());
        tracker
            .track_usage(&UsageRequest::new(Provider::OpenAI, "gpt-4", 1000))
            .unwrap();
        let september = tracker.current_period();
        clock.advance(Duration::days(30));

        let report = tracker.usage_report(Provider::OpenAI, september).unwrap();
        assert_eq!(report.month, "2026-09");
        assert_eq!(report.usage.len(), 1);
        assert!((report.budget.current_spend - 0.03).abs() < 1e-12);

        let current = tracker
            .usage_report(Provider::OpenAI, tracker.current_period())
            .unwrap();
        assert!(current.usage.is_empty());
    }

    #[test]
    fn monthly_reset_creates_then_noops() {
        let (tracker, _store) = tracker();
        let first = tracker.monthly_reset().unwrap();
        assert!(first.iter().all(|o| o.action.is_created()));
        assert!((first[0].action.budget_limit() - 10.0).abs() < f64::EPSILON);
        assert!((first[1].action.budget_limit() - 8.0).abs() < f64::EPSILON);

        let second = tracker.monthly_reset().unwrap();
        assert!(second.iter().all(|o| !o.action.is_created()));
    }

    #[test]
    fn monthly_reset_keeps_existing_record() {
        let (tracker, _store) = tracker();
        let period = tracker.current_period();
        tracker.set_budget(Provider::OpenAI, period, 42.0).unwrap();
        let outcomes = tracker.monthly_reset().unwrap();
        assert_eq!(
            outcomes[0].action,
            ResetAction::AlreadyExists { budget_limit: 42.0 }
        );
    }

    #[test]
    fn monthly_reset_carries_previous_limit() {
        let clock = Arc::new(FixedClock::at(2026, 9, 20));
        let (tracker, _store) = tracker_at(clock.clone());
        tracker
            .set_budget(Provider::Gemini, tracker.current_period(), 15.0)
            .unwrap();
        clock.advance(Duration::days(15));

        let outcomes = tracker.monthly_reset().unwrap();
        assert_eq!(outcomes[1].month, "2026-10");
        assert_eq!(
            outcomes[1].action,
            ResetAction::Created {
                budget_limit: 15.0,
                carried_from: Some("2026-09".to_string()),
            }
        );
        assert_eq!(
            outcomes[0].action,
            ResetAction::Created {
                budget_limit: 10.0,
                carried_from: None,
            }
        );
    }

    #[test]
    fn mark_unknown_alert_is_not_found() {
        let (tracker, _store) = tracker();
        assert!(matches!(
            tracker.mark_alert_read(7),
            Err(SpendError::AlertNotFound(7))
        ));
    }

    #[test]
    fn alerts_report_unread_count() {
        let (tracker, _store) = tracker();
        spend(&tracker, 9);
        tracker.evaluate(Provider::OpenAI).unwrap();
        let list = tracker.alerts(&AlertQuery::default()).unwrap();
        assert_eq!(list.alerts.len(), 2);
        assert_eq!(list.unread_count, 2);
        tracker.mark_alert_read(list.alerts[0].id).unwrap();
        assert_eq!(tracker.alerts(&AlertQuery::default()).unwrap().unread_count, 1);
    }

    // -------------------------------------------------------------------------
    // Alert write failures
    // -------------------------------------------------------------------------

    /// Delegates to a memory store but fails every alert write.
    struct AlertlessStore(MemoryStore);

    impl UsageStore for AlertlessStore {
        fn backend_name(&self) -> &'static str {
            "alertless"
        }
        fn ping(&self) -> Result<()> {
            self.0.ping()
        }
        fn record_usage(&self, event: &NewUsageEvent) -> Result<i64> {
            self.0.record_usage(event)
        }
        fn monthly_totals(
            &self,
            provider: Provider,
            period: BudgetPeriod,
        ) -> Result<Vec<UsageAggregate>> {
            self.0.monthly_totals(provider, period)
        }
        fn provider_totals(
            &self,
            provider: Provider,
            period: BudgetPeriod,
        ) -> Result<ProviderTotals> {
            self.0.provider_totals(provider, period)
        }
        fn set_limit(
            &self,
            provider: Provider,
            period: BudgetPeriod,
            limit: f64,
            at: DateTime<Utc>,
        ) -> Result<BudgetRecord> {
            self.0.set_limit(provider, period, limit, at)
        }
        fn create_budget_if_absent(
            &self,
            provider: Provider,
            period: BudgetPeriod,
            limit: f64,
            at: DateTime<Utc>,
        ) -> Result<Option<BudgetRecord>> {
            self.0.create_budget_if_absent(provider, period, limit, at)
        }
        fn get_budget(
            &self,
            provider: Provider,
            period: BudgetPeriod,
        ) -> Result<Option<BudgetRecord>> {
            self.0.get_budget(provider, period)
        }
        fn record_alert(&self, _alert: &NewAlert) -> Result<i64> {
            Err(SpendError::storage("insert alert", "disk full"))
        }
        fn list_alerts(&self, query: &AlertQuery) -> Result<Vec<AlertRecord>> {
            self.0.list_alerts(query)
        }
        fn unread_alert_count(&self) -> Result<u64> {
            self.0.unread_alert_count()
        }
        fn last_alert_at(
            &self,
            provider: Provider,
            severity: AlertSeverity,
            period: BudgetPeriod,
        ) -> Result<Option<DateTime<Utc>>> {
            self.0.last_alert_at(provider, severity, period)
        }
        fn mark_alert_read(&self, id: i64) -> Result<bool> {
            self.0.mark_alert_read(id)
        }
    }

    #[test]
    fn alert_failure_does_not_fail_tracking() {
        let store = Arc::new(AlertlessStore(MemoryStore::new()));
        let tracker = UsageTracker::new(
            store.clone(),
            PricingTable::builtin(),
            TrackerSettings::default(),
        )
        .with_clock(Arc::new(FixedClock::at(2026, 10, 14)));

        let tracked = tracker
            .track_usage(&UsageRequest::new(Provider::OpenAI, "gpt-4", 320_000))
            .unwrap();
        assert_eq!(tracked.status, BudgetStatus::Critical);
        assert!(tracked.alert_id.is_none());
        let spend = store
            .period_spend(Provider::OpenAI, tracker.current_period())
            .unwrap();
        assert!((spend - 9.6).abs() < 1e-9);
    }

    #[test]
    fn alert_failure_propagates_from_evaluate() {
        let store = Arc::new(AlertlessStore(MemoryStore::new()));
        let tracker = UsageTracker::new(store, PricingTable::builtin(), TrackerSettings::default())
            .with_clock(Arc::new(FixedClock::at(2026, 10, 14)));
        tracker
            .track_usage(&UsageRequest::new(Provider::OpenAI, "gpt-4", 320_000))
            .unwrap();
        let err = tracker.evaluate(Provider::OpenAI).unwrap_err();
        assert!(matches!(err, SpendError::Storage { .. }));
    }
}
