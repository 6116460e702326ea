use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ChangeRequest, PersonId, ScheduleEntry, Verdict, WorkTypeId};

/// Input for changing one day of a person's schedule
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateScheduleInput {
    pub person_id: PersonId,
    pub date: NaiveDate,
    pub work_type_id: WorkTypeId,
    /// Required when the change has to go through approval.
    pub reason: Option<String>,
}

/// Result of a schedule edit attempt
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScheduleMutationOutcome {
    Applied { entry: ScheduleEntry },
    RequestCreated { request: ChangeRequest },
    PermissionError { message: String },
}

/// Input for filling a month with the default work type
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkApplyInput {
    pub year: i32,
    pub month: u32,
    pub person_ids: Vec<PersonId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkApplyResponse {
    pub success: bool,
    pub count: u64,
}

/// Proof upload; `image` is the base64-encoded image file.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadProofInput {
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadProofResponse {
    pub verdict: Verdict,
    pub entry: ScheduleEntry,
}

/// Response for entry mutations without a body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EntryMutationResponse {
    pub success: bool,
    pub message: Option<String>,
}
