use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::PersonId;

pub const BASE_ANNUAL_LEAVE: f64 = 15.0;
pub const MAX_ANNUAL_LEAVE: f64 = 25.0;

/// Materialized leave balance. `used_leave` always equals the live sum of
/// deduction weights of the person's entries within the ledger period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LeaveLedger {
    pub person_id: PersonId,
    pub total_leave: f64,
    pub used_leave: f64,
    /// First day of the period `used_leave` was summed over; `None` for all time.
    pub period_start: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

impl LeaveLedger {
    pub fn remaining(&self) -> f64 {
        self.total_leave - self.used_leave
    }

    pub fn summary(&self) -> LedgerSummary {
        LedgerSummary {
            person_id: self.person_id,
            total: self.total_leave,
            used: self.used_leave,
            remaining: self.remaining(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LedgerSummary {
    pub person_id: PersonId,
    pub total: f64,
    pub used: f64,
    pub remaining: f64,
}

/// Result of reconciling a ledger against its source rows.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerChange {
    pub previous_used: f64,
    pub ledger: LeaveLedger,
}

impl LedgerChange {
    pub fn changed(&self) -> bool {
        self.previous_used != self.ledger.used_leave
    }
}

/// A schedule write and the ledger reconciliation committed with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled<T> {
    pub value: T,
    pub ledger: LedgerChange,
}

/// Which entries count towards `used_leave`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedgerPeriod {
    #[default]
    AllTime,
    CalendarYear,
}

impl LedgerPeriod {
    /// Inclusive date range for the period containing `today`, or `None` for all time.
    pub fn range(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            LedgerPeriod::AllTime => None,
            LedgerPeriod::CalendarYear => year_range(today.year()),
        }
    }

    /// Whether `ledger` was last summed over the period containing `today`.
    pub fn is_current(&self, ledger: &LeaveLedger, today: NaiveDate) -> bool {
        ledger.period_start == self.range(today).map(|(start, _)| start)
    }
}

impl std::str::FromStr for LedgerPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "all_time" => Ok(LedgerPeriod::AllTime),
            "year" | "calendar_year" => Ok(LedgerPeriod::CalendarYear),
            other => Err(format!("Unknown ledger period: {}", other)),
        }
    }
}

pub fn year_range(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((NaiveDate::from_ymd_opt(year, 1, 1)?, NaiveDate::from_ymd_opt(year, 12, 31)?))
}

/// Annual allowance by tenure: 15 days, one extra day every two years after
/// the first year of service, capped at 25.
pub fn annual_allowance(joined_at: Option<NaiveDate>, year: i32) -> f64 {
    let Some(joined_at) = joined_at else {
        return BASE_ANNUAL_LEAVE;
    };

    let years_worked = year - joined_at.year();
    if years_worked < 1 {
        return BASE_ANNUAL_LEAVE;
    }

    let added = ((years_worked - 1) / 2).max(0) as f64;
    (BASE_ANNUAL_LEAVE + added).min(MAX_ANNUAL_LEAVE)
}

/// Input for overriding a person's total allowance
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetAllowanceInput {
    pub total_leave: f64,
}
