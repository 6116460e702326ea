use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;

use crate::{
    models::{
        ChangeRequest, CreateWorkTypeInput, EntryAnnotation, LeaveLedger, LedgerChange, NewChangeRequest, PersonId,
        Reconciled, RequestId, ScheduleEntry, UpdateWorkTypeInput, VerificationRecord, WorkType, WorkTypeId,
    },
    AppError, AppResult,
};

#[cfg(test)]
pub mod memory;
pub mod postgres;

#[cfg(test)]
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Inclusive date range.
pub type DateRange = (NaiveDate, NaiveDate);

pub(crate) fn ledger_not_opened(person_id: PersonId) -> AppError {
    AppError::Conflict(format!("Leave ledger for person {} has not been opened", person_id))
}

/// Durable state of the attendance core.
///
/// Every method is a single unit of work. Writes that can move a deduction
/// take a `period` and return [`Reconciled`]: they lock the person's ledger
/// first, write the entry, then store the live deduction sum over `period`,
/// all in one transaction. A person without a ledger gets
/// `AppError::Conflict` and nothing is written.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn list_work_types(&self) -> AppResult<Vec<WorkType>>;
    async fn get_work_type(&self, id: WorkTypeId) -> AppResult<Option<WorkType>>;
    async fn find_work_type_by_name(&self, name: &str) -> AppResult<Option<WorkType>>;
    /// Fails with `Conflict` when the name is taken.
    async fn create_work_type(&self, input: &CreateWorkTypeInput) -> AppResult<WorkType>;
    /// Get-or-create by name; returns true when a row was inserted.
    async fn insert_work_type_if_missing(&self, input: &CreateWorkTypeInput) -> AppResult<bool>;
    async fn update_work_type(&self, id: WorkTypeId, input: &UpdateWorkTypeInput) -> AppResult<Option<WorkType>>;
    async fn people_using_work_type(&self, id: WorkTypeId) -> AppResult<Vec<PersonId>>;
    /// Deletes the type and nulls entry references. Returns the people whose
    /// entries referenced it, or `None` when the type does not exist.
    async fn delete_work_type(&self, id: WorkTypeId) -> AppResult<Option<Vec<PersonId>>>;

    async fn get_entry(&self, person_id: PersonId, date: NaiveDate) -> AppResult<Option<ScheduleEntry>>;
    async fn upsert_entry(
        &self,
        person_id: PersonId,
        date: NaiveDate,
        work_type_id: Option<WorkTypeId>,
        period: Option<DateRange>,
    ) -> AppResult<Reconciled<ScheduleEntry>>;
    /// Writes verdict fields; a missing entry is created with `default_work_type`.
    async fn record_verification(
        &self,
        person_id: PersonId,
        date: NaiveDate,
        default_work_type: Option<WorkTypeId>,
        record: &VerificationRecord,
        period: Option<DateRange>,
    ) -> AppResult<Reconciled<ScheduleEntry>>;
    /// Absent flag and memo do not count towards leave, so no reconciliation.
    async fn annotate_entry(
        &self,
        person_id: PersonId,
        date: NaiveDate,
        annotation: &EntryAnnotation,
    ) -> AppResult<Option<ScheduleEntry>>;
    /// Returns the removed entry, or `None` when there was none.
    async fn delete_entry(
        &self,
        person_id: PersonId,
        date: NaiveDate,
        period: Option<DateRange>,
    ) -> AppResult<Option<Reconciled<ScheduleEntry>>>;
    /// Inserts entries only for dates without one; returns how many were created.
    async fn insert_missing_entries(
        &self,
        person_id: PersonId,
        dates: &[NaiveDate],
        work_type_id: WorkTypeId,
        period: Option<DateRange>,
    ) -> AppResult<Reconciled<u64>>;
    /// Newest first.
    async fn list_entries_for_person(&self, person_id: PersonId) -> AppResult<Vec<ScheduleEntry>>;
    async fn list_entries_in_range(&self, people: &[PersonId], range: DateRange) -> AppResult<Vec<ScheduleEntry>>;

    /// Creates the ledger row once; returns false when it already existed.
    async fn open_ledger(&self, person_id: PersonId, total_leave: f64) -> AppResult<bool>;
    async fn get_ledger(&self, person_id: PersonId) -> AppResult<Option<LeaveLedger>>;
    async fn list_ledgers(&self, people: &[PersonId]) -> AppResult<Vec<LeaveLedger>>;
    async fn set_ledger_total(&self, person_id: PersonId, total_leave: f64) -> AppResult<Option<LeaveLedger>>;
    async fn sum_deductions(&self, person_id: PersonId, range: Option<DateRange>) -> AppResult<f64>;
    /// One grouped sum for many people; people without deductions are absent.
    async fn sum_deductions_by_person(
        &self,
        people: &[PersonId],
        range: Option<DateRange>,
    ) -> AppResult<HashMap<PersonId, f64>>;
    /// Re-sums `used_leave` over `period` without writing any entry.
    async fn reconcile_ledger(&self, person_id: PersonId, period: Option<DateRange>) -> AppResult<LedgerChange>;

    async fn create_request(&self, request: &NewChangeRequest) -> AppResult<ChangeRequest>;
    async fn get_request(&self, id: RequestId) -> AppResult<Option<ChangeRequest>>;
    /// Oldest first; `None` lists every requester.
    async fn list_pending_requests(&self, requesters: Option<&[PersonId]>) -> AppResult<Vec<ChangeRequest>>;
    /// Marks a pending request approved and applies it to the requester's
    /// schedule. Returns `None` when the request is no longer pending, and
    /// `Conflict` when its work type has been deleted.
    async fn approve_request(
        &self,
        id: RequestId,
        approver_id: PersonId,
        period: Option<DateRange>,
    ) -> AppResult<Option<Reconciled<(ChangeRequest, ScheduleEntry)>>>;
    /// Marks a pending request rejected. Returns `None` when it is no longer pending.
    async fn reject_request(&self, id: RequestId, approver_id: PersonId) -> AppResult<Option<ChangeRequest>>;
}
