//! In-memory implementation of [`UsageStore`].
//!
//! State lives for the life of the process. Semantics match the `SQLite`
//! backend, including the (provider, month, year) uniqueness of budgets.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::core::alerts::{AlertQuery, AlertRecord, AlertSeverity, NewAlert};
use crate::core::models::{
    BudgetRecord, NewUsageEvent, ProviderTotals, UsageAggregate, UsageEvent,
};
use crate::core::period::BudgetPeriod;
use crate::core::provider::Provider;
use crate::error::{Result, SpendError};
use crate::storage::UsageStore;

#[derive(Debug, Default)]
struct MemoryState {
    usage: Vec<UsageEvent>,
    budgets: Vec<BudgetRecord>,
    alerts: Vec<AlertRecord>,
    next_usage_id: i64,
    next_budget_id: i64,
    next_alert_id: i64,
}

impl MemoryState {
    fn usage_in(
        &self,
        provider: Provider,
        period: BudgetPeriod,
    ) -> impl Iterator<Item = &UsageEvent> {
        let label = period.label();
        self.usage
            .iter()
            .filter(move |e| e.provider == provider && e.month == label && e.year == period.year)
    }

    fn budget_index(&self, provider: Provider, period: BudgetPeriod) -> Option<usize> {
        let label = period.label();
        self.budgets
            .iter()
            .position(|b| b.provider == provider && b.month == label && b.year == period.year)
    }

    fn insert_budget(
        &mut self,
        provider: Provider,
        period: BudgetPeriod,
        limit: f64,
        at: DateTime<Utc>,
    ) -> BudgetRecord {
        self.next_budget_id += 1;
        let record = BudgetRecord {
            id: self.next_budget_id,
            provider,
            month: period.label(),
            year: period.year,
            budget_limit: limit,
            created_at: at,
            updated_at: at,
        };
        self.budgets.push(record.clone());
        record
    }
}

/// Process-local usage store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| SpendError::storage("lock memory store", "state mutex poisoned"))
    }
}

impl UsageStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn ping(&self) -> Result<()> {
        self.state().map(|_| ())
    }

    fn record_usage(&self, event: &NewUsageEvent) -> Result<i64> {
        let mut state = self.state()?;
        state.next_usage_id += 1;
        let id = state.next_usage_id;
        state.usage.push(UsageEvent {
            id,
            provider: event.provider,
            model: event.model.clone(),
            tokens: event.tokens,
            cost: event.cost,
            request_type: event.request_type,
            timestamp: event.timestamp,
            month: event.period.label(),
            year: event.period.year,
        });
        Ok(id)
    }

    fn monthly_totals(
        &self,
        provider: Provider,
        period: BudgetPeriod,
    ) -> Result<Vec<UsageAggregate>> {
        let state = self.state()?;
        let mut groups: Vec<UsageAggregate> = Vec::new();
        for event in state.usage_in(provider, period) {
            if let Some(group) = groups
                .iter_mut()
                .find(|g| g.request_type == event.request_type && g.model == event.model)
            {
                group.total_tokens = group.total_tokens.saturating_add(event.tokens);
                group.total_cost += event.cost;
                group.request_count = group.request_count.saturating_add(1);
            } else {
                groups.push(UsageAggregate {
                    request_type: event.request_type,
                    model: event.model.clone(),
                    total_tokens: event.tokens,
                    total_cost: event.cost,
                    request_count: 1,
                });
            }
        }
        groups.sort_by(|a, b| {
            a.request_type
                .as_str()
                .cmp(b.request_type.as_str())
                .then_with(|| a.model.cmp(&b.model))
        });
        Ok(groups)
    }

    fn provider_totals(&self, provider: Provider, period: BudgetPeriod) -> Result<ProviderTotals> {
        let state = self.state()?;
        Ok(state
            .usage_in(provider, period)
            .fold(ProviderTotals::default(), |mut acc, e| {
                acc.total_tokens = acc.total_tokens.saturating_add(e.tokens);
                acc.total_cost += e.cost;
                acc.total_requests = acc.total_requests.saturating_add(1);
                acc
            }))
    }

    fn set_limit(
        &self,
        provider: Provider,
        period: BudgetPeriod,
        limit: f64,
        at: DateTime<Utc>,
    ) -> Result<BudgetRecord> {
        let mut state = self.state()?;
        if let Some(idx) = state.budget_index(provider, period) {
            let record = &mut state.budgets[idx];
            record.budget_limit = limit;
            record.updated_at = at;
            return Ok(record.clone());
        }
        Ok(state.insert_budget(provider, period, limit, at))
    }

    fn create_budget_if_absent(
        &self,
        provider: Provider,
        period: BudgetPeriod,
        limit: f64,
        at: DateTime<Utc>,
    ) -> Result<Option<BudgetRecord>> {
        let mut state = self.state()?;
        if state.budget_index(provider, period).is_some() {
            return Ok(None);
        }
        Ok(Some(state.insert_budget(provider, period, limit, at)))
    }

    fn get_budget(&self, provider: Provider, period: BudgetPeriod) -> Result<Option<BudgetRecord>> {
        let state = self.state()?;
        Ok(state
            .budget_index(provider, period)
            .map(|idx| state.budgets[idx].clone()))
    }

    fn record_alert(&self, alert: &NewAlert) -> Result<i64> {
        let mut state = self.state()?;
        state.next_alert_id += 1;
        let id = state.next_alert_id;
        state.alerts.push(AlertRecord {
            id,
            provider: alert.provider,
            alert_type: alert.severity,
            threshold_percent: alert.threshold,
            current_spend: alert.current_spend,
            budget_limit: alert.budget_limit,
            message: alert.message.clone(),
            sent_at: alert.sent_at,
            month: alert.period.label(),
            year: alert.period.year,
            is_read: false,
        });
        Ok(id)
    }

    fn list_alerts(&self, query: &AlertQuery) -> Result<Vec<AlertRecord>> {
        let state = self.state()?;
        let mut alerts: Vec<AlertRecord> = state
            .alerts
            .iter()
            .filter(|a| query.matches(a))
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.sent_at.cmp(&a.sent_at).then_with(|| b.id.cmp(&a.id)));
        alerts.truncate(query.limit);
        Ok(alerts)
    }

    fn unread_alert_count(&self) -> Result<u64> {
        let state = self.state()?;
        let unread = state.alerts.iter().filter(|a| !a.is_read).count();
        Ok(u64::try_from(unread).unwrap_or(u64::MAX))
    }

    fn last_alert_at(
        &self,
        provider: Provider,
        severity: AlertSeverity,
        period: BudgetPeriod,
    ) -> Result<Option<DateTime<Utc>>> {
        let state = self.state()?;
        let label = period.label();
        Ok(state
            .alerts
            .iter()
            .filter(|a| {
                a.provider == provider
                    && a.alert_type == severity
                    && a.month == label
                    && a.year == period.year
            })
            .map(|a| a.sent_at)
            .max())
    }

    fn mark_alert_read(&self, id: i64) -> Result<bool> {
        let mut state = self.state()?;
        Ok(state.alerts.iter_mut().find(|a| a.id == id).is_some_and(|a| {
            a.is_read = true;
            true
        }))
    }
}
