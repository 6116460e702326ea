pub mod calendar;
pub mod change_request;
pub mod ledger;
pub mod person;
pub mod schedule;
pub mod schedule_input;
pub mod verification;
pub mod work_type;
pub mod work_type_input;

pub use calendar::{CalendarCell, CalendarDay, CalendarFilter, CalendarQuery, CalendarRow, MonthCalendar, MonthlyCounts};
pub use change_request::{
    ChangeRequest, ChangeRequestRow, ChangeRequestWithDetails, DecisionAction, DecisionInput, NewChangeRequest,
    RequestId, RequestStatus,
};
pub use ledger::{
    annual_allowance, LeaveLedger, LedgerChange, LedgerPeriod, LedgerSummary, Reconciled, SetAllowanceInput,
};
pub use person::{Person, PersonId, RosterRole};
pub use schedule::{EntryAnnotation, ScheduleEntry, StoredProof, VerificationRecord};
pub use schedule_input::{
    BulkApplyInput, BulkApplyResponse, EntryMutationResponse, ScheduleMutationOutcome, UpdateScheduleInput,
    UploadProofInput, UploadProofResponse,
};
pub use verification::Verdict;
pub use work_type::{WorkType, WorkTypeId, STANDARD_WORK_TYPES};
pub use work_type_input::{CreateWorkTypeInput, UpdateWorkTypeInput, WorkTypeMutationResponse};
