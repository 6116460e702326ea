use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
use std::sync::Arc;

use super::{Attendance, Collaborators, ServiceSettings};
use crate::{
    clock::FixedClock,
    directory::MemoryDirectory,
    events::EventBus,
    holidays::HolidaySet,
    models::{ChangeRequest, LedgerPeriod, Person, PersonId, ScheduleMutationOutcome, UpdateScheduleInput, WorkTypeId},
    proofs::{FixedVerdict, MemoryImageStore, ProofAnalyzer},
    store::{MemoryStore, ScheduleStore},
};

pub fn day(year: i32, month: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, d).unwrap()
}

fn person(id: PersonId, name: &str, scope_id: Option<i32>, joined: Option<NaiveDate>) -> Person {
    Person {
        id,
        name: name.to_string(),
        scope_id,
        cohort_id: Some(1),
        is_manager: false,
        is_admin: false,
        joined_at: joined,
        active: true,
    }
}

/// An attendance core over in-memory collaborators, frozen at Monday
/// 2026-10-19 08:50 in UTC+9 with holidays on 2026-10-03 and 2026-10-09.
///
/// Scope 10 holds `manager`, `trainee` and `peer`; scope 20 holds
/// `other_manager` and `outsider`; `admin` has no scope.
pub struct Harness {
    pub attendance: Arc<Attendance>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
    pub admin: Person,
    pub manager: Person,
    pub trainee: Person,
    pub peer: Person,
    pub outsider: Person,
    pub other_manager: Person,
}

impl Harness {
    pub async fn new() -> Self {
        let h = Self::build(Arc::new(FixedVerdict::verified()), LedgerPeriod::AllTime).await;
        h.attendance.open_missing_ledgers().await.unwrap();
        h
    }

    pub async fn without_ledgers() -> Self {
        Self::build(Arc::new(FixedVerdict::verified()), LedgerPeriod::AllTime).await
    }

    pub async fn with_analyzer(analyzer: FixedVerdict) -> Self {
        let h = Self::build(Arc::new(analyzer), LedgerPeriod::AllTime).await;
        h.attendance.open_missing_ledgers().await.unwrap();
        h
    }

    pub async fn with_period(period: LedgerPeriod) -> Self {
        let h = Self::build(Arc::new(FixedVerdict::verified()), period).await;
        h.attendance.open_missing_ledgers().await.unwrap();
        h
    }

    async fn build(analyzer: Arc<dyn ProofAnalyzer>, ledger_period: LedgerPeriod) -> Self {
        let mut admin = person(1, "Admin", None, None);
        admin.is_admin = true;
        let mut manager = person(2, "Manager Kim", Some(10), Some(day(2021, 3, 1)));
        manager.is_manager = true;
        let trainee = person(3, "Trainee Lee", Some(10), Some(day(2026, 3, 2)));
        let peer = person(4, "Trainee Park", Some(10), Some(day(2026, 3, 2)));
        let outsider = person(5, "Trainee Choi", Some(20), Some(day(2026, 3, 2)));
        let mut other_manager = person(6, "Manager Jung", Some(20), Some(day(2024, 1, 2)));
        other_manager.is_manager = true;

        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 18, 23, 50, 0).unwrap()));
        let directory = MemoryDirectory::new([
            admin.clone(),
            manager.clone(),
            trainee.clone(),
            peer.clone(),
            outsider.clone(),
            other_manager.clone(),
        ]);

        let attendance = Attendance::new(
            Collaborators {
                store: store.clone(),
                directory: Arc::new(directory),
                holidays: Arc::new(HolidaySet::new([day(2026, 10, 3), day(2026, 10, 9)])),
                clock: clock.clone(),
                analyzer,
                images: Arc::new(MemoryImageStore::default()),
            },
            EventBus::default(),
            ServiceSettings {
                utc_offset: FixedOffset::east_opt(9 * 3600).unwrap(),
                ledger_period,
                default_work_type: "Normal work".to_string(),
            },
        );
        attendance.seed_standard_work_types().await.unwrap();

        Self {
            attendance: Arc::new(attendance),
            store,
            clock,
            admin,
            manager,
            trainee,
            peer,
            outsider,
            other_manager,
        }
    }

    pub async fn work_type(&self, name: &str) -> WorkTypeId {
        self.store.find_work_type_by_name(name).await.unwrap().unwrap().id
    }

    /// Sets an entry through the ledger-maintaining path.
    pub async fn apply(&self, person_id: PersonId, date: NaiveDate, work_type_id: WorkTypeId) {
        self.attendance.apply_entry(person_id, date, work_type_id).await.unwrap();
    }

    /// Files a pending request by an actor who may not edit directly.
    pub async fn file_request(
        &self,
        actor: &Person,
        person_id: PersonId,
        date: NaiveDate,
        work_type_id: WorkTypeId,
    ) -> ChangeRequest {
        let input = UpdateScheduleInput {
            person_id,
            date,
            work_type_id,
            reason: Some("please".to_string()),
        };
        match self.attendance.mutate_schedule(actor, input).await.unwrap() {
            ScheduleMutationOutcome::RequestCreated { request } => request,
            other => panic!("expected a request, got {:?}", other),
        }
    }
}
