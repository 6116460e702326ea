use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{LedgerSummary, PersonId, RosterRole, WorkTypeId};

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub role: Option<RosterRole>,
    #[serde(rename = "scopeId")]
    pub scope_id: Option<i32>,
    #[serde(rename = "cohortId")]
    pub cohort_id: Option<i32>,
}

/// Which people a calendar covers; managers may set every field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalendarFilter {
    pub role: RosterRole,
    pub scope_id: Option<i32>,
    pub cohort_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// 0 = Monday .. 6 = Sunday
    pub weekday: u32,
    pub is_weekend: bool,
    pub is_holiday: bool,
    pub is_today: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalendarCell {
    /// A stored entry with a known work type.
    Scheduled {
        work_type_id: WorkTypeId,
        short_name: String,
        color: String,
    },
    /// A stored entry whose work type was deleted.
    Unassigned,
    /// No entry on a working day; shown as normal work.
    DefaultWork,
    /// No entry on a weekend or holiday.
    Off,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MonthlyCounts {
    pub worked: u32,
    pub rest: u32,
    pub full_leave: u32,
    pub half_leave: u32,
    pub other: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CalendarRow {
    pub person_id: PersonId,
    pub name: String,
    pub cells: Vec<CalendarCell>,
    pub counts: MonthlyCounts,
    pub ledger: Option<LedgerSummary>,
    /// Deductions booked in the calendar's year.
    pub year_used: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MonthCalendar {
    pub year: i32,
    pub month: u32,
    pub days: Vec<CalendarDay>,
    pub rows: Vec<CalendarRow>,
    pub is_manager: bool,
}
