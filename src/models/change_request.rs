use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::{PersonId, WorkTypeId};
use crate::AppError;

pub type RequestId = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            other => Err(AppError::Internal(format!("Unknown request status: {}", other))),
        }
    }
}

/// A proposal to change `requester_id`'s schedule on `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChangeRequest {
    pub id: RequestId,
    pub requester_id: PersonId,
    pub submitted_by: PersonId,
    pub date: NaiveDate,
    /// `None` once the requested work type has been deleted.
    pub target_work_type_id: Option<WorkTypeId>,
    pub reason: String,
    pub status: RequestStatus,
    pub approver_id: Option<PersonId>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Row shape of `"ScheduleRequests"`; status is stored as text.
#[derive(Debug, FromRow)]
pub struct ChangeRequestRow {
    pub id: RequestId,
    pub requester_id: PersonId,
    pub submitted_by: PersonId,
    pub date: NaiveDate,
    pub target_work_type_id: Option<WorkTypeId>,
    pub reason: String,
    pub status: String,
    pub approver_id: Option<PersonId>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl TryFrom<ChangeRequestRow> for ChangeRequest {
    type Error = AppError;

    fn try_from(row: ChangeRequestRow) -> Result<Self, Self::Error> {
        Ok(ChangeRequest {
            id: row.id,
            requester_id: row.requester_id,
            submitted_by: row.submitted_by,
            date: row.date,
            target_work_type_id: row.target_work_type_id,
            reason: row.reason,
            status: row.status.parse()?,
            approver_id: row.approver_id,
            created_at: row.created_at,
            resolved_at: row.resolved_at,
        })
    }
}

/// Values for a new pending request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChangeRequest {
    pub requester_id: PersonId,
    pub submitted_by: PersonId,
    pub date: NaiveDate,
    pub target_work_type_id: WorkTypeId,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChangeRequestWithDetails {
    #[serde(flatten)]
    pub request: ChangeRequest,
    pub requester_name: String,
    pub work_type_name: String,
    pub work_type_short_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DecisionAction {
    Approve,
    Reject,
}

impl DecisionAction {
    pub fn resulting_status(&self) -> RequestStatus {
        match self {
            DecisionAction::Approve => RequestStatus::Approved,
            DecisionAction::Reject => RequestStatus::Rejected,
        }
    }
}

/// Input for approving or rejecting a pending request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DecisionInput {
    pub action: DecisionAction,
}
