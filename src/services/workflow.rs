use chrono::{Datelike, NaiveDate};
use metrics::counter;
use std::collections::HashMap;

use super::Attendance;
use crate::{
    models::{
        ChangeRequest, ChangeRequestWithDetails, DecisionAction, NewChangeRequest, Person, PersonId, RequestId,
        ScheduleMutationOutcome, UpdateScheduleInput,
    },
    AppError, AppResult,
};

/// Where a date falls relative to today for edit purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
    /// Before today.
    Past,
    /// From today up to the end of the current month.
    Current,
    /// From the first day of next month on.
    Future,
}

impl DateWindow {
    pub fn classify(date: NaiveDate, today: NaiveDate) -> Self {
        if date < today {
            DateWindow::Past
        } else if date < next_month_start(today) {
            DateWindow::Current
        } else {
            DateWindow::Future
        }
    }
}

/// First day of the calendar month after `today`.
pub fn next_month_start(today: NaiveDate) -> NaiveDate {
    let (year, month) = if today.month() == 12 {
        (today.year() + 1, 1)
    } else {
        (today.year(), today.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MAX)
}

impl Attendance {
    /// Applies a schedule edit, files it for approval, or refuses it,
    /// depending on the date window and the actor's relation to the person.
    pub async fn mutate_schedule(&self, actor: &Person, input: UpdateScheduleInput) -> AppResult<ScheduleMutationOutcome> {
        let target = self.person(input.person_id).await?;
        if self.store.get_work_type(input.work_type_id).await?.is_none() {
            return Err(AppError::Validation(format!("Unknown work type {}", input.work_type_id)));
        }

        let window = DateWindow::classify(input.date, self.today());
        let owner_or_manager = actor.id == target.id || actor.manages(&target);

        tracing::debug!(
            actor_id = actor.id,
            person_id = target.id,
            date = %input.date,
            ?window,
            "Evaluating schedule edit"
        );

        match window {
            DateWindow::Past if !actor.is_admin => Ok(ScheduleMutationOutcome::PermissionError {
                message: "Past dates can only be changed by an administrator".to_string(),
            }),
            DateWindow::Future if !owner_or_manager => Ok(ScheduleMutationOutcome::PermissionError {
                message: "Only the person or their manager can change future dates".to_string(),
            }),
            DateWindow::Current if !owner_or_manager => {
                let reason = input.reason.as_deref().map(str::trim).unwrap_or_default();
                if reason.is_empty() {
                    return Err(AppError::Validation("A reason is required to request this change".to_string()));
                }

                let request = self
                    .store
                    .create_request(&NewChangeRequest {
                        requester_id: target.id,
                        submitted_by: actor.id,
                        date: input.date,
                        target_work_type_id: input.work_type_id,
                        reason: reason.to_string(),
                    })
                    .await?;

                counter!("change_requests_total", "status" => request.status.as_str()).increment(1);
                tracing::info!(
                    request_id = request.id,
                    person_id = target.id,
                    submitted_by = actor.id,
                    date = %input.date,
                    "Schedule change request filed"
                );
                Ok(ScheduleMutationOutcome::RequestCreated { request })
            }
            _ => {
                let entry = self.apply_entry(target.id, input.date, input.work_type_id).await?;
                Ok(ScheduleMutationOutcome::Applied { entry })
            }
        }
    }

    /// Pending requests the actor may decide, oldest first.
    pub async fn list_pending_requests(&self, actor: &Person) -> AppResult<Vec<ChangeRequestWithDetails>> {
        let people = self.directory.list_people().await?;

        let pending = if actor.is_admin {
            self.store.list_pending_requests(None).await?
        } else if actor.is_manager {
            let scope: Vec<PersonId> = people
                .iter()
                .filter(|p| p.id != actor.id && actor.manages(p))
                .map(|p| p.id)
                .collect();
            self.store.list_pending_requests(Some(scope.as_slice())).await?
        } else {
            return Ok(Vec::new());
        };

        let names: HashMap<PersonId, String> = people.into_iter().map(|p| (p.id, p.name)).collect();
        let work_types: HashMap<_, _> = self
            .store
            .list_work_types()
            .await?
            .into_iter()
            .map(|w| (w.id, (w.name, w.short_name)))
            .collect();

        let detailed = pending
            .into_iter()
            .map(|request| {
                let requester_name = names.get(&request.requester_id).cloned().unwrap_or_default();
                let (work_type_name, work_type_short_name) = request
                    .target_work_type_id
                    .and_then(|id| work_types.get(&id))
                    .cloned()
                    .unwrap_or_default();
                ChangeRequestWithDetails {
                    request,
                    requester_name,
                    work_type_name,
                    work_type_short_name,
                }
            })
            .collect();
        Ok(detailed)
    }

    /// Approves (applying the requested type) or rejects a pending request.
    pub async fn decide_request(&self, actor: &Person, id: RequestId, action: DecisionAction) -> AppResult<ChangeRequest> {
        let request = self
            .store
            .get_request(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))?;

        if request.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Request {} is already {}",
                id,
                request.status.as_str()
            )));
        }

        let requester = self.person(request.requester_id).await?;
        if !actor.is_admin {
            if actor.id == requester.id {
                return Err(AppError::Forbidden("Managers cannot decide their own requests".to_string()));
            }
            if !actor.manages(&requester) {
                return Err(AppError::Forbidden(format!("Not authorized to decide request {}", id)));
            }
        }

        let decided = match action {
            DecisionAction::Approve => {
                if request.target_work_type_id.is_none() {
                    return Err(AppError::Conflict(format!("Request {} targets a deleted work type", id)));
                }

                let _guard = self.ledgers.lock(requester.id).await;
                let approved = self
                    .store
                    .approve_request(id, actor.id, self.ledgers.period(self.today()))
                    .await?
                    .ok_or_else(|| AppError::Conflict(format!("Request {} was decided concurrently", id)))?;
                self.ledgers.record(&approved.ledger);
                let (decided, entry) = approved.value;

                tracing::info!(
                    request_id = id,
                    approver_id = actor.id,
                    person_id = requester.id,
                    date = %entry.date,
                    "Schedule change request approved"
                );
                decided
            }
            DecisionAction::Reject => {
                let decided = self
                    .store
                    .reject_request(id, actor.id)
                    .await?
                    .ok_or_else(|| AppError::Conflict(format!("Request {} was decided concurrently", id)))?;

                tracing::info!(request_id = id, approver_id = actor.id, "Schedule change request rejected");
                decided
            }
        };

        counter!("change_requests_total", "status" => action.resulting_status().as_str()).increment(1);
        Ok(decided)
    }
}
