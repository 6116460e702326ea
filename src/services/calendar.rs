use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;

use super::{bulk::month_days, Attendance};
use crate::{
    holidays::is_weekend,
    models::{
        ledger::year_range, CalendarCell, CalendarDay, CalendarFilter, CalendarRow, MonthCalendar, MonthlyCounts,
        Person, PersonId, RosterRole, WorkType,
    },
    AppError, AppResult,
};

/// Adds one day's cell to the monthly tally.
fn tally(counts: &mut MonthlyCounts, day: &CalendarDay, work_type: Option<Option<&WorkType>>) {
    match work_type {
        Some(Some(w)) if w.deduction == 1.0 => counts.full_leave += 1,
        Some(Some(w)) if w.deduction > 0.0 && w.deduction < 1.0 => counts.half_leave += 1,
        Some(Some(w)) if w.is_working_day && w.deduction == 0.0 => counts.worked += 1,
        Some(Some(w)) if !w.is_working_day => counts.rest += 1,
        Some(_) => counts.other += 1,
        None if day.is_weekend || day.is_holiday => counts.rest += 1,
        None => counts.worked += 1,
    }
}

impl Attendance {
    /// People a calendar shows to `actor`.
    ///
    /// Staff choose the roster and may narrow it by scope and cohort; trainees
    /// see fellow trainees of their own scope, or only themselves without one.
    async fn roster(&self, actor: &Person, filter: CalendarFilter) -> AppResult<Vec<Person>> {
        let people = self.directory.list_people().await?;

        let roster = if actor.is_staff() {
            people
                .into_iter()
                .filter(|p| match filter.role {
                    RosterRole::Staff => p.is_staff(),
                    RosterRole::Trainees => !p.is_staff(),
                })
                .filter(|p| filter.scope_id.map(|s| p.scope_id == Some(s)).unwrap_or(true))
                .filter(|p| filter.cohort_id.map(|c| p.cohort_id == Some(c)).unwrap_or(true))
                .collect()
        } else {
            people
                .into_iter()
                .filter(|p| !p.is_staff())
                .filter(|p| match actor.scope_id {
                    Some(scope) => p.scope_id == Some(scope),
                    None => p.id == actor.id,
                })
                .collect()
        };
        Ok(roster)
    }

    /// Day-by-person matrix for one month with monthly counts and ledger balances.
    pub async fn get_calendar(&self, actor: &Person, year: i32, month: u32, filter: CalendarFilter) -> AppResult<MonthCalendar> {
        let dates = month_days(year, month)
            .ok_or_else(|| AppError::Validation(format!("Invalid month {}-{}", year, month)))?;
        let (first, last) = match (dates.first(), dates.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(AppError::Validation(format!("Invalid month {}-{}", year, month))),
        };
        let today = self.today();

        let days: Vec<CalendarDay> = dates
            .iter()
            .map(|&date| CalendarDay {
                date,
                weekday: date.weekday().num_days_from_monday(),
                is_weekend: is_weekend(date),
                is_holiday: self.holidays.is_holiday(date),
                is_today: date == today,
            })
            .collect();

        let people = self.roster(actor, filter).await?;
        let ids: Vec<PersonId> = people.iter().map(|p| p.id).collect();

        let work_types: HashMap<_, _> = self.store.list_work_types().await?.into_iter().map(|w| (w.id, w)).collect();
        let mut entries: HashMap<(PersonId, NaiveDate), Option<i32>> = HashMap::new();
        for entry in self.store.list_entries_in_range(&ids, (first, last)).await? {
            entries.insert((entry.person_id, entry.date), entry.work_type_id);
        }
        let mut ledgers = HashMap::new();
        for ledger in self.store.list_ledgers(&ids).await? {
            let ledger = self.ledgers.refresh(ledger, today).await?;
            ledgers.insert(ledger.person_id, ledger.summary());
        }
        let year_used = match year_range(year) {
            Some(range) => self.store.sum_deductions_by_person(&ids, Some(range)).await?,
            None => HashMap::new(),
        };

        let mut rows = Vec::with_capacity(people.len());
        for person in people {
            let mut counts = MonthlyCounts::default();
            let mut cells = Vec::with_capacity(days.len());

            for day in &days {
                // Outer None: no entry. Inner None: entry whose type was deleted.
                let stored = entries
                    .get(&(person.id, day.date))
                    .copied()
                    .map(|type_id| type_id.and_then(|id| work_types.get(&id)));
                tally(&mut counts, day, stored);

                cells.push(match stored {
                    Some(Some(w)) => CalendarCell::Scheduled {
                        work_type_id: w.id,
                        short_name: w.short_name.clone(),
                        color: w.color.clone(),
                    },
                    Some(None) => CalendarCell::Unassigned,
                    None if day.is_weekend || day.is_holiday => CalendarCell::Off,
                    None => CalendarCell::DefaultWork,
                });
            }

            rows.push(CalendarRow {
                person_id: person.id,
                name: person.name,
                cells,
                counts,
                ledger: ledgers.get(&person.id).copied(),
                year_used: year_used.get(&person.id).copied().unwrap_or(0.0),
            });
        }

        Ok(MonthCalendar {
            year,
            month,
            days,
            rows,
            is_manager: actor.is_staff(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::fixtures::{day, Harness},
        store::ScheduleStore,
    };

    fn row<'a>(calendar: &'a MonthCalendar, person_id: PersonId) -> &'a CalendarRow {
        calendar.rows.iter().find(|r| r.person_id == person_id).unwrap()
    }

    #[tokio::test]
    async fn counts_follow_work_type_weights() {
        let h = Harness::new().await;
        h.apply(h.trainee.id, day(2026, 10, 12), h.work_type("Annual leave").await).await;
        h.apply(h.trainee.id, day(2026, 10, 13), h.work_type("Morning half-day").await).await;
        h.apply(h.trainee.id, day(2026, 10, 14), h.work_type("Day off").await).await;
        h.apply(h.trainee.id, day(2026, 10, 15), h.work_type("Official leave").await).await;
        h.apply(h.trainee.id, day(2026, 10, 17), h.work_type("Normal work").await).await;

        let calendar = h.attendance.get_calendar(&h.manager, 2026, 10, CalendarFilter::default()).await.unwrap();
        assert_eq!(calendar.days.len(), 31);
        assert!(calendar.days[18].is_today);
        assert!(calendar.is_manager);

        let trainee = row(&calendar, h.trainee.id);
        // 31 days: 9 weekend days (one worked), holiday on the 9th, 4 typed weekdays
        assert_eq!(
            trainee.counts,
            MonthlyCounts {
                worked: 17 + 1 + 1,
                rest: 8 + 1 + 1,
                full_leave: 1,
                half_leave: 1,
                other: 0,
            }
        );
        assert_eq!(trainee.year_used, 1.5);
        assert_eq!(trainee.ledger.unwrap().remaining, 13.5);
        assert_eq!(trainee.cells[8], CalendarCell::Off);
        assert_eq!(trainee.cells[9], CalendarCell::Off);
        assert_eq!(trainee.cells[0], CalendarCell::DefaultWork);
    }

    #[tokio::test]
    async fn entry_without_type_counts_as_other() {
        let h = Harness::new().await;
        let extra = h.store.upsert_entry(h.trainee.id, day(2026, 10, 20), None, None).await.unwrap().value;
        assert_eq!(extra.work_type_id, None);

        let calendar = h.attendance.get_calendar(&h.admin, 2026, 10, CalendarFilter::default()).await.unwrap();
        let trainee = row(&calendar, h.trainee.id);
        assert_eq!(trainee.counts.other, 1);
        assert_eq!(trainee.cells[19], CalendarCell::Unassigned);
    }

    #[tokio::test]
    async fn trainees_see_their_scope_only() {
        let h = Harness::new().await;
        let calendar = h
            .attendance
            .get_calendar(
                &h.trainee,
                2026,
                10,
                CalendarFilter {
                    role: RosterRole::Staff,
                    scope_id: Some(20),
                    cohort_id: None,
                },
            )
            .await
            .unwrap();

        let ids: Vec<PersonId> = calendar.rows.iter().map(|r| r.person_id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&h.trainee.id) && ids.contains(&h.peer.id));
        assert!(!calendar.is_manager);
    }

    #[tokio::test]
    async fn staff_filter_by_role_and_scope() {
        let h = Harness::new().await;
        let staff = h
            .attendance
            .get_calendar(
                &h.manager,
                2026,
                10,
                CalendarFilter {
                    role: RosterRole::Staff,
                    scope_id: None,
                    cohort_id: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(staff.rows.len(), 3);

        let scoped = h
            .attendance
            .get_calendar(
                &h.manager,
                2026,
                10,
                CalendarFilter {
                    role: RosterRole::Trainees,
                    scope_id: Some(20),
                    cohort_id: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(scoped.rows.len(), 1);
        assert_eq!(scoped.rows[0].person_id, h.outsider.id);
    }

    #[tokio::test]
    async fn year_used_is_summed_per_person_for_the_shown_year() {
        let h = Harness::new().await;
        let annual = h.work_type("Annual leave").await;
        h.apply(h.trainee.id, day(2026, 10, 20), annual).await;
        h.apply(h.trainee.id, day(2027, 1, 5), annual).await;
        h.apply(h.peer.id, day(2026, 11, 2), h.work_type("Morning half-day").await).await;

        let calendar = h.attendance.get_calendar(&h.admin, 2026, 10, CalendarFilter::default()).await.unwrap();
        assert_eq!(row(&calendar, h.trainee.id).year_used, 1.0);
        assert_eq!(row(&calendar, h.peer.id).year_used, 0.5);
        assert_eq!(row(&calendar, h.outsider.id).year_used, 0.0);

        let next_year = h.attendance.get_calendar(&h.admin, 2027, 1, CalendarFilter::default()).await.unwrap();
        assert_eq!(row(&next_year, h.trainee.id).year_used, 1.0);
        assert_eq!(row(&next_year, h.peer.id).year_used, 0.0);
    }

    #[tokio::test]
    async fn invalid_month_is_rejected() {
        let h = Harness::new().await;
        assert!(matches!(
            h.attendance.get_calendar(&h.admin, 2026, 0, CalendarFilter::default()).await,
            Err(AppError::Validation(_))
        ));
    }
}
