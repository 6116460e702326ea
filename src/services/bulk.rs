use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

use super::Attendance;
use crate::{
    holidays::is_weekend,
    models::{Person, PersonId},
    AppError, AppResult,
};

/// Every date of the month, or `None` for an invalid year/month.
pub fn month_days(year: i32, month: u32) -> Option<Vec<NaiveDate>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    Some(
        first
            .iter_days()
            .take_while(|d| d.month0() == first.month0())
            .collect(),
    )
}

impl Attendance {
    /// Fills weekdays that are not holidays with the default work type for
    /// each managed person, leaving existing entries untouched. Returns how
    /// many entries were created.
    pub async fn bulk_apply(&self, actor: &Person, year: i32, month: u32, person_ids: &[PersonId]) -> AppResult<u64> {
        if !actor.is_staff() {
            return Err(AppError::Forbidden("Only managers can assign default schedules".to_string()));
        }

        let days = month_days(year, month)
            .ok_or_else(|| AppError::Validation(format!("Invalid month {}-{}", year, month)))?;
        let working_days: Vec<NaiveDate> = days
            .into_iter()
            .filter(|d| !is_weekend(*d) && !self.holidays.is_holiday(*d))
            .collect();

        let default_type = self
            .default_work_type()
            .await?
            .ok_or_else(|| AppError::Validation("No default work type is configured".to_string()))?;

        let unique: BTreeSet<PersonId> = person_ids.iter().copied().collect();
        let mut people = Vec::with_capacity(unique.len());
        for id in unique {
            people.push(self.person(id).await?);
        }

        let period = self.ledgers.period(self.today());
        let mut created = 0;
        for person in people {
            if !actor.manages(&person) {
                tracing::debug!(person_id = person.id, actor_id = actor.id, "Skipping person outside responsibility");
                continue;
            }

            let _guard = self.ledgers.lock(person.id).await;
            let inserted = self
                .store
                .insert_missing_entries(person.id, &working_days, default_type.id, period)
                .await?;
            self.ledgers.record(&inserted.ledger);
            created += inserted.value;
        }

        tracing::info!(actor_id = actor.id, year, month, created, "Default schedule applied");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::fixtures::{day, Harness},
        store::ScheduleStore,
    };

    #[test]
    fn month_days_handles_lengths() {
        assert_eq!(month_days(2026, 2).unwrap().len(), 28);
        assert_eq!(month_days(2028, 2).unwrap().len(), 29);
        assert_eq!(month_days(2026, 12).unwrap().last(), Some(&day(2026, 12, 31)));
        assert!(month_days(2026, 13).is_none());
    }

    #[tokio::test]
    async fn fills_weekdays_once() {
        // October 2026: 22 weekdays, holidays on Fri 9th and Sat 3rd
        let h = Harness::new().await;
        let ids = [h.trainee.id, h.peer.id];

        let first = h.attendance.bulk_apply(&h.manager, 2026, 10, &ids).await.unwrap();
        assert_eq!(first, 2 * 21);

        let second = h.attendance.bulk_apply(&h.manager, 2026, 10, &ids).await.unwrap();
        assert_eq!(second, 0);

        assert!(h.store.get_entry(h.trainee.id, day(2026, 10, 9)).await.unwrap().is_none());
        assert!(h.store.get_entry(h.trainee.id, day(2026, 10, 10)).await.unwrap().is_none());
        assert!(h.store.get_entry(h.trainee.id, day(2026, 10, 12)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn existing_entries_are_kept() {
        let h = Harness::new().await;
        let annual = h.work_type("Annual leave").await;
        h.apply(h.trainee.id, day(2026, 10, 12), annual).await;

        let created = h.attendance.bulk_apply(&h.admin, 2026, 10, &[h.trainee.id]).await.unwrap();
        assert_eq!(created, 20);

        let kept = h.store.get_entry(h.trainee.id, day(2026, 10, 12)).await.unwrap().unwrap();
        assert_eq!(kept.work_type_id, Some(annual));
        assert_eq!(h.store.get_ledger(h.trainee.id).await.unwrap().unwrap().used_leave, 1.0);
    }

    #[tokio::test]
    async fn people_outside_responsibility_are_skipped() {
        let h = Harness::new().await;
        let created = h
            .attendance
            .bulk_apply(&h.manager, 2026, 10, &[h.trainee.id, h.outsider.id])
            .await
            .unwrap();
        assert_eq!(created, 21);
        assert_eq!(h.store.list_entries_for_person(h.outsider.id).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn trainees_and_unknown_ids_are_refused() {
        let h = Harness::new().await;
        assert!(matches!(
            h.attendance.bulk_apply(&h.trainee, 2026, 10, &[h.trainee.id]).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            h.attendance.bulk_apply(&h.admin, 2026, 10, &[h.trainee.id, 999]).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(h.store.entry_count().await, 0);
    }
}
