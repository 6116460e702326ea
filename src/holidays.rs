use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::BTreeSet;

pub trait HolidayCalendar: Send + Sync {
    fn is_holiday(&self, date: NaiveDate) -> bool;
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// A fixed set of public holidays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidaySet {
    dates: BTreeSet<NaiveDate>,
}

impl HolidaySet {
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    /// Parses a comma-separated list of ISO dates, e.g. `2026-10-03,2026-10-09`.
    pub fn parse(list: &str) -> Result<Self, String> {
        let dates = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("Invalid holiday '{}': {}", s, e)))
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { dates })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }
}

impl HolidayCalendar for HolidaySet {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }
}
