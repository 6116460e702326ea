//! In-process store used by the test suites.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;

use super::{ledger_not_opened, DateRange, ScheduleStore};
use crate::{
    models::{
        ChangeRequest, CreateWorkTypeInput, EntryAnnotation, LeaveLedger, LedgerChange, NewChangeRequest, PersonId,
        Reconciled, RequestId, RequestStatus, ScheduleEntry, UpdateWorkTypeInput, VerificationRecord, WorkType,
        WorkTypeId,
    },
    AppError, AppResult,
};

#[derive(Default)]
struct Inner {
    work_types: BTreeMap<WorkTypeId, WorkType>,
    entries: BTreeMap<(PersonId, NaiveDate), ScheduleEntry>,
    ledgers: HashMap<PersonId, LeaveLedger>,
    requests: BTreeMap<RequestId, ChangeRequest>,
    next_work_type_id: i32,
    next_entry_id: i32,
    next_request_id: i32,
}

impl Inner {
    fn blank_entry(&mut self, person_id: PersonId, date: NaiveDate, work_type_id: Option<WorkTypeId>) -> ScheduleEntry {
        self.next_entry_id += 1;
        ScheduleEntry {
            id: self.next_entry_id,
            person_id,
            date,
            work_type_id,
            proof_image: None,
            proof_sha256: None,
            captured_at: None,
            is_verified: false,
            is_late: false,
            is_absent: false,
            memo: String::new(),
            updated_at: Utc::now(),
        }
    }

    fn upsert(&mut self, person_id: PersonId, date: NaiveDate, work_type_id: Option<WorkTypeId>) -> ScheduleEntry {
        if let Some(entry) = self.entries.get_mut(&(person_id, date)) {
            entry.work_type_id = work_type_id;
            entry.updated_at = Utc::now();
            return entry.clone();
        }
        let entry = self.blank_entry(person_id, date, work_type_id);
        self.entries.insert((person_id, date), entry.clone());
        entry
    }

    fn sum(&self, person_id: PersonId, range: Option<DateRange>) -> f64 {
        self.entries
            .values()
            .filter(|e| e.person_id == person_id)
            .filter(|e| range.map(|(start, end)| e.date >= start && e.date <= end).unwrap_or(true))
            .filter_map(|e| e.work_type_id.and_then(|id| self.work_types.get(&id)))
            .map(|w| w.deduction)
            .sum()
    }

    /// Checked before any write, like the ledger row lock in Postgres.
    fn require_ledger(&self, person_id: PersonId) -> AppResult<()> {
        if self.ledgers.contains_key(&person_id) {
            Ok(())
        } else {
            Err(ledger_not_opened(person_id))
        }
    }

    fn settle(&mut self, person_id: PersonId, period: Option<DateRange>) -> AppResult<LedgerChange> {
        let used = self.sum(person_id, period);
        let period_start = period.map(|(start, _)| start);
        let ledger = self.ledgers.get_mut(&person_id).ok_or_else(|| ledger_not_opened(person_id))?;

        let previous_used = ledger.used_leave;
        if used != previous_used || period_start != ledger.period_start {
            ledger.used_leave = used;
            ledger.period_start = period_start;
            ledger.updated_at = Utc::now();
        }
        Ok(LedgerChange {
            previous_used,
            ledger: ledger.clone(),
        })
    }

    fn name_taken(&self, name: &str, except: Option<WorkTypeId>) -> bool {
        self.work_types.values().any(|w| w.name == name && Some(w.id) != except)
    }

    fn insert_work_type(&mut self, input: &CreateWorkTypeInput) -> WorkType {
        self.next_work_type_id += 1;
        let work_type = WorkType {
            id: self.next_work_type_id,
            name: input.name.clone(),
            short_name: input.short_name.clone(),
            color: input.color.clone(),
            deduction: input.deduction,
            is_working_day: input.is_working_day,
            sort_order: input.sort_order,
        };
        self.work_types.insert(work_type.id, work_type.clone());
        work_type
    }

    fn resolve(&mut self, id: RequestId, status: RequestStatus, approver_id: PersonId) -> Option<ChangeRequest> {
        let request = self.requests.get_mut(&id)?;
        if request.status != RequestStatus::Pending {
            return None;
        }
        request.status = status;
        request.approver_id = Some(approver_id);
        request.resolved_at = Some(Utc::now());
        Some(request.clone())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entry_count(&self) -> usize {
        self.inner.read().await.entries.len()
    }
}

#[async_trait]
impl ScheduleStore for MemoryStore {
    async fn list_work_types(&self) -> AppResult<Vec<WorkType>> {
        let inner = self.inner.read().await;
        let mut types: Vec<WorkType> = inner.work_types.values().cloned().collect();
        types.sort_by_key(|w| (w.sort_order, w.id));
        Ok(types)
    }

    async fn get_work_type(&self, id: WorkTypeId) -> AppResult<Option<WorkType>> {
        Ok(self.inner.read().await.work_types.get(&id).cloned())
    }

    async fn find_work_type_by_name(&self, name: &str) -> AppResult<Option<WorkType>> {
        let inner = self.inner.read().await;
        Ok(inner.work_types.values().find(|w| w.name == name).cloned())
    }

    async fn create_work_type(&self, input: &CreateWorkTypeInput) -> AppResult<WorkType> {
        let mut inner = self.inner.write().await;
        if inner.name_taken(&input.name, None) {
            return Err(AppError::Conflict(format!("Work type '{}' already exists", input.name)));
        }
        Ok(inner.insert_work_type(input))
    }

    async fn insert_work_type_if_missing(&self, input: &CreateWorkTypeInput) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        if inner.name_taken(&input.name, None) {
            return Ok(false);
        }
        inner.insert_work_type(input);
        Ok(true)
    }

    async fn update_work_type(&self, id: WorkTypeId, input: &UpdateWorkTypeInput) -> AppResult<Option<WorkType>> {
        let mut inner = self.inner.write().await;
        if let Some(name) = &input.name {
            if inner.name_taken(name, Some(id)) {
                return Err(AppError::Conflict(format!("Work type '{}' already exists", name)));
            }
        }

        let Some(work_type) = inner.work_types.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            work_type.name = name.clone();
        }
        if let Some(short_name) = &input.short_name {
            work_type.short_name = short_name.clone();
        }
        if let Some(color) = &input.color {
            work_type.color = color.clone();
        }
        if let Some(deduction) = input.deduction {
            work_type.deduction = deduction;
        }
        if let Some(is_working_day) = input.is_working_day {
            work_type.is_working_day = is_working_day;
        }
        if let Some(sort_order) = input.sort_order {
            work_type.sort_order = sort_order;
        }
        Ok(Some(work_type.clone()))
    }

    async fn people_using_work_type(&self, id: WorkTypeId) -> AppResult<Vec<PersonId>> {
        let inner = self.inner.read().await;
        let people: BTreeSet<PersonId> = inner
            .entries
            .values()
            .filter(|e| e.work_type_id == Some(id))
            .map(|e| e.person_id)
            .collect();
        Ok(people.into_iter().collect())
    }

    async fn delete_work_type(&self, id: WorkTypeId) -> AppResult<Option<Vec<PersonId>>> {
        let mut inner = self.inner.write().await;
        if inner.work_types.remove(&id).is_none() {
            return Ok(None);
        }

        let mut people = BTreeSet::new();
        for entry in inner.entries.values_mut().filter(|e| e.work_type_id == Some(id)) {
            entry.work_type_id = None;
            people.insert(entry.person_id);
        }
        for request in inner.requests.values_mut().filter(|r| r.target_work_type_id == Some(id)) {
            request.target_work_type_id = None;
        }
        Ok(Some(people.into_iter().collect()))
    }

    async fn get_entry(&self, person_id: PersonId, date: NaiveDate) -> AppResult<Option<ScheduleEntry>> {
        Ok(self.inner.read().await.entries.get(&(person_id, date)).cloned())
    }

    async fn upsert_entry(
        &self,
        person_id: PersonId,
        date: NaiveDate,
        work_type_id: Option<WorkTypeId>,
        period: Option<DateRange>,
    ) -> AppResult<Reconciled<ScheduleEntry>> {
        let mut inner = self.inner.write().await;
        inner.require_ledger(person_id)?;
        let entry = inner.upsert(person_id, date, work_type_id);
        let ledger = inner.settle(person_id, period)?;
        Ok(Reconciled { value: entry, ledger })
    }

    async fn record_verification(
        &self,
        person_id: PersonId,
        date: NaiveDate,
        default_work_type: Option<WorkTypeId>,
        record: &VerificationRecord,
        period: Option<DateRange>,
    ) -> AppResult<Reconciled<ScheduleEntry>> {
        let mut inner = self.inner.write().await;
        inner.require_ledger(person_id)?;
        if !inner.entries.contains_key(&(person_id, date)) {
            let entry = inner.blank_entry(person_id, date, default_work_type);
            inner.entries.insert((person_id, date), entry);
        }

        let Some(entry) = inner.entries.get_mut(&(person_id, date)) else {
            return Err(AppError::Internal("entry vanished under write lock".to_string()));
        };
        entry.proof_image = Some(record.proof.key.clone());
        entry.proof_sha256 = Some(record.proof.sha256.clone());
        entry.captured_at = record.captured_at;
        entry.is_verified = record.is_verified;
        entry.is_late = record.is_late;
        entry.updated_at = Utc::now();
        let entry = entry.clone();

        let ledger = inner.settle(person_id, period)?;
        Ok(Reconciled { value: entry, ledger })
    }

    async fn annotate_entry(
        &self,
        person_id: PersonId,
        date: NaiveDate,
        annotation: &EntryAnnotation,
    ) -> AppResult<Option<ScheduleEntry>> {
        let mut inner = self.inner.write().await;
        let Some(entry) = inner.entries.get_mut(&(person_id, date)) else {
            return Ok(None);
        };
        if let Some(is_absent) = annotation.is_absent {
            entry.is_absent = is_absent;
        }
        if let Some(memo) = &annotation.memo {
            entry.memo = memo.clone();
        }
        entry.updated_at = Utc::now();
        Ok(Some(entry.clone()))
    }

    async fn delete_entry(
        &self,
        person_id: PersonId,
        date: NaiveDate,
        period: Option<DateRange>,
    ) -> AppResult<Option<Reconciled<ScheduleEntry>>> {
        let mut inner = self.inner.write().await;
        inner.require_ledger(person_id)?;
        let Some(entry) = inner.entries.remove(&(person_id, date)) else {
            return Ok(None);
        };
        let ledger = inner.settle(person_id, period)?;
        Ok(Some(Reconciled { value: entry, ledger }))
    }

    async fn insert_missing_entries(
        &self,
        person_id: PersonId,
        dates: &[NaiveDate],
        work_type_id: WorkTypeId,
        period: Option<DateRange>,
    ) -> AppResult<Reconciled<u64>> {
        let mut inner = self.inner.write().await;
        inner.require_ledger(person_id)?;
        let mut created = 0;
        for &date in dates {
            if inner.entries.contains_key(&(person_id, date)) {
                continue;
            }
            let entry = inner.blank_entry(person_id, date, Some(work_type_id));
            inner.entries.insert((person_id, date), entry);
            created += 1;
        }
        let ledger = inner.settle(person_id, period)?;
        Ok(Reconciled { value: created, ledger })
    }

    async fn list_entries_for_person(&self, person_id: PersonId) -> AppResult<Vec<ScheduleEntry>> {
        let inner = self.inner.read().await;
        let mut entries: Vec<ScheduleEntry> =
            inner.entries.values().filter(|e| e.person_id == person_id).cloned().collect();
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(entries)
    }

    async fn list_entries_in_range(&self, people: &[PersonId], range: DateRange) -> AppResult<Vec<ScheduleEntry>> {
        let inner = self.inner.read().await;
        Ok(inner
            .entries
            .values()
            .filter(|e| people.contains(&e.person_id) && e.date >= range.0 && e.date <= range.1)
            .cloned()
            .collect())
    }

    async fn open_ledger(&self, person_id: PersonId, total_leave: f64) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        if inner.ledgers.contains_key(&person_id) {
            return Ok(false);
        }
        inner.ledgers.insert(
            person_id,
            LeaveLedger {
                person_id,
                total_leave,
                used_leave: 0.0,
                period_start: None,
                updated_at: Utc::now(),
            },
        );
        Ok(true)
    }

    async fn get_ledger(&self, person_id: PersonId) -> AppResult<Option<LeaveLedger>> {
        Ok(self.inner.read().await.ledgers.get(&person_id).cloned())
    }

    async fn list_ledgers(&self, people: &[PersonId]) -> AppResult<Vec<LeaveLedger>> {
        let inner = self.inner.read().await;
        Ok(people.iter().filter_map(|p| inner.ledgers.get(p).cloned()).collect())
    }

    async fn set_ledger_total(&self, person_id: PersonId, total_leave: f64) -> AppResult<Option<LeaveLedger>> {
        let mut inner = self.inner.write().await;
        let Some(ledger) = inner.ledgers.get_mut(&person_id) else {
            return Ok(None);
        };
        ledger.total_leave = total_leave;
        ledger.updated_at = Utc::now();
        Ok(Some(ledger.clone()))
    }

    async fn sum_deductions(&self, person_id: PersonId, range: Option<DateRange>) -> AppResult<f64> {
        Ok(self.inner.read().await.sum(person_id, range))
    }

    async fn sum_deductions_by_person(
        &self,
        people: &[PersonId],
        range: Option<DateRange>,
    ) -> AppResult<HashMap<PersonId, f64>> {
        let inner = self.inner.read().await;
        let mut sums = HashMap::new();
        for entry in inner.entries.values().filter(|e| people.contains(&e.person_id)) {
            if range.map(|(start, end)| entry.date < start || entry.date > end).unwrap_or(false) {
                continue;
            }
            if let Some(work_type) = entry.work_type_id.and_then(|id| inner.work_types.get(&id)) {
                *sums.entry(entry.person_id).or_insert(0.0) += work_type.deduction;
            }
        }
        Ok(sums)
    }

    async fn reconcile_ledger(&self, person_id: PersonId, period: Option<DateRange>) -> AppResult<LedgerChange> {
        self.inner.write().await.settle(person_id, period)
    }

    async fn create_request(&self, request: &NewChangeRequest) -> AppResult<ChangeRequest> {
        let mut inner = self.inner.write().await;
        inner.next_request_id += 1;
        let created = ChangeRequest {
            id: inner.next_request_id,
            requester_id: request.requester_id,
            submitted_by: request.submitted_by,
            date: request.date,
            target_work_type_id: Some(request.target_work_type_id),
            reason: request.reason.clone(),
            status: RequestStatus::Pending,
            approver_id: None,
            created_at: Utc::now(),
            resolved_at: None,
        };
        inner.requests.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_request(&self, id: RequestId) -> AppResult<Option<ChangeRequest>> {
        Ok(self.inner.read().await.requests.get(&id).cloned())
    }

    async fn list_pending_requests(&self, requesters: Option<&[PersonId]>) -> AppResult<Vec<ChangeRequest>> {
        let inner = self.inner.read().await;
        Ok(inner
            .requests
            .values()
            .filter(|r| r.status == RequestStatus::Pending)
            .filter(|r| requesters.map(|ids| ids.contains(&r.requester_id)).unwrap_or(true))
            .cloned()
            .collect())
    }

    async fn approve_request(
        &self,
        id: RequestId,
        approver_id: PersonId,
        period: Option<DateRange>,
    ) -> AppResult<Option<Reconciled<(ChangeRequest, ScheduleEntry)>>> {
        let mut inner = self.inner.write().await;
        let Some(pending) = inner.requests.get(&id).filter(|r| r.status == RequestStatus::Pending).cloned() else {
            return Ok(None);
        };
        let work_type_id = pending
            .target_work_type_id
            .ok_or_else(|| AppError::Conflict(format!("Request {} targets a deleted work type", id)))?;
        inner.require_ledger(pending.requester_id)?;

        let Some(request) = inner.resolve(id, RequestStatus::Approved, approver_id) else {
            return Ok(None);
        };
        let entry = inner.upsert(request.requester_id, request.date, Some(work_type_id));
        let ledger = inner.settle(request.requester_id, period)?;
        Ok(Some(Reconciled {
            value: (request, entry),
            ledger,
        }))
    }

    async fn reject_request(&self, id: RequestId, approver_id: PersonId) -> AppResult<Option<ChangeRequest>> {
        Ok(self.inner.write().await.resolve(id, RequestStatus::Rejected, approver_id))
    }
}
