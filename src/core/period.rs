//! Calendar-month budget periods and the clock that picks the current one.

use std::sync::Mutex;

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpendError};

// =============================================================================
// Budget Period
// =============================================================================

/// A UTC calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BudgetPeriod {
    pub year: i32,
    pub month: u32,
}

impl BudgetPeriod {
    /// Build a period, rejecting months outside 1..=12.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(SpendError::InvalidPeriod(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        if !(1970..=9999).contains(&year) {
            return Err(SpendError::InvalidPeriod(format!(
                "year out of range: {year}"
            )));
        }
        Ok(Self { year, month })
    }

    /// Period containing the given instant.
    #[must_use]
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }

    /// `YYYY-MM` label stored alongside every ledger row.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Parse a `YYYY-MM` label.
    pub fn parse_label(label: &str) -> Result<Self> {
        let trimmed = label.trim();
        let (year, month) = trimmed
            .split_once('-')
            .ok_or_else(|| SpendError::InvalidPeriod(format!("expected YYYY-MM, got '{label}'")))?;
        if year.len() != 4 || month.len() != 2 {
            return Err(SpendError::InvalidPeriod(format!(
                "expected YYYY-MM, got '{label}'"
            )));
        }
        let year: i32 = year
            .parse()
            .map_err(|_| SpendError::InvalidPeriod(format!("invalid year in '{label}'")))?;
        let month: u32 = month
            .parse()
            .map_err(|_| SpendError::InvalidPeriod(format!("invalid month in '{label}'")))?;
        Self::new(year, month)
    }

    /// The month before this one.
    #[must_use]
    pub const fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Resolve optional `month`/`year` query values against the current period.
    ///
    /// `month` may be `YYYY-MM` or a bare month number. A `YYYY-MM` month that
    /// disagrees with an explicit `year` is rejected.
    pub fn resolve(month: Option<&str>, year: Option<i32>, current: Self) -> Result<Self> {
        let month = month.map(str::trim).filter(|m| !m.is_empty());
        match (month, year) {
            (None, None) => Ok(current),
            (None, Some(year)) => Self::new(year, current.month),
            (Some(m), year) if m.contains('-') => {
                let period = Self::parse_label(m)?;
                match year {
                    Some(y) if y != period.year => Err(SpendError::InvalidPeriod(format!(
                        "month '{m}' does not match year {y}"
                    ))),
                    _ => Ok(period),
                }
            }
            (Some(m), year) => {
                let month: u32 = m
                    .parse()
                    .map_err(|_| SpendError::InvalidPeriod(format!("invalid month '{m}'")))?;
                Self::new(year.unwrap_or(current.year), month)
            }
        }
    }
}

impl std::fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

// =============================================================================
// Clock
// =============================================================================

/// Source of "now" for period selection and timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn current_period(&self) -> BudgetPeriod {
        BudgetPeriod::from_datetime(self.now())
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually controlled clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Clock pinned to noon UTC on the given day.
    ///
    /// Falls back to the Unix epoch for an impossible date.
    #[must_use]
    pub fn at(year: i32, month: u32, day: u32) -> Self {
        let now = Utc
            .with_ymd_and_hms(year, month, day, 12, 0, 0)
            .single()
            .unwrap_or_default();
        Self::new(now)
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
            .lock()
            .map_or_else(|poisoned| *poisoned.into_inner(), |guard| *guard)
    }
}
