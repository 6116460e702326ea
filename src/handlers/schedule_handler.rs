use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Datelike, NaiveDate};
use std::sync::Arc;

use crate::{
    extractors::AuthenticatedUser,
    models::{
        BulkApplyInput, BulkApplyResponse, CalendarFilter, CalendarQuery, EntryAnnotation, EntryMutationResponse,
        MonthCalendar, PersonId, ScheduleEntry, ScheduleMutationOutcome, UpdateScheduleInput,
    },
    AppResult, AppState,
};

/// GET /api/schedule/calendar?year=&month=&role=&scopeId=&cohortId=
#[utoipa::path(
    get,
    path = "/api/schedule/calendar",
    params(CalendarQuery),
    responses(
        (status = 200, description = "Day-by-person matrix for the month (defaults to the current month)", body = MonthCalendar),
        (status = 422, description = "Invalid year or month")
    ),
    tag = "schedule",
    security(("cookie_auth" = []))
)]
pub async fn get_calendar(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Query(query): Query<CalendarQuery>,
) -> AppResult<Json<MonthCalendar>> {
    let today = state.attendance.today();
    let year = query.year.unwrap_or(today.year());
    let month = query.month.unwrap_or(today.month());

    let filter = CalendarFilter {
        role: query.role.unwrap_or_default(),
        scope_id: query.scope_id,
        cohort_id: query.cohort_id,
    };

    let calendar = state.attendance.get_calendar(&auth.person, year, month, filter).await?;
    Ok(Json(calendar))
}

/// POST /api/schedule - Change one day of a person's schedule
///
/// Applies directly when the caller may edit the date, otherwise files a
/// change request. The `status` field tells which happened.
#[utoipa::path(
    post,
    path = "/api/schedule",
    request_body = UpdateScheduleInput,
    responses(
        (status = 200, description = "Change applied", body = ScheduleMutationOutcome),
        (status = 202, description = "Change request created and awaiting approval", body = ScheduleMutationOutcome),
        (status = 403, description = "Caller may not change this date", body = ScheduleMutationOutcome),
        (status = 422, description = "Unknown person or work type, or missing reason")
    ),
    tag = "schedule",
    security(("cookie_auth" = []))
)]
pub async fn mutate_schedule(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Json(input): Json<UpdateScheduleInput>,
) -> AppResult<(StatusCode, Json<ScheduleMutationOutcome>)> {
    let outcome = state.attendance.mutate_schedule(&auth.person, input).await?;

    let status = match &outcome {
        ScheduleMutationOutcome::Applied { .. } => StatusCode::OK,
        ScheduleMutationOutcome::RequestCreated { .. } => StatusCode::ACCEPTED,
        ScheduleMutationOutcome::PermissionError { .. } => StatusCode::FORBIDDEN,
    };

    Ok((status, Json(outcome)))
}

/// POST /api/schedule/bulk-default - Fill a month with the default work type
#[utoipa::path(
    post,
    path = "/api/schedule/bulk-default",
    request_body = BulkApplyInput,
    responses(
        (status = 200, description = "Number of entries created", body = BulkApplyResponse),
        (status = 403, description = "Caller is not a manager or administrator"),
        (status = 422, description = "Invalid month or unknown person")
    ),
    tag = "schedule",
    security(("cookie_auth" = []))
)]
pub async fn bulk_default(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Json(input): Json<BulkApplyInput>,
) -> AppResult<Json<BulkApplyResponse>> {
    let count = state
        .attendance
        .bulk_apply(&auth.person, input.year, input.month, &input.person_ids)
        .await?;

    Ok(Json(BulkApplyResponse { success: true, count }))
}

/// PUT /api/schedule/{person_id}/{date} - Set the absent flag or memo
#[utoipa::path(
    put,
    path = "/api/schedule/{person_id}/{date}",
    params(
        ("person_id" = i32, Path, description = "Person ID"),
        ("date" = String, Path, description = "Date (YYYY-MM-DD)")
    ),
    request_body = EntryAnnotation,
    responses(
        (status = 200, description = "Annotated entry", body = ScheduleEntry),
        (status = 403, description = "Caller does not manage this person"),
        (status = 404, description = "No entry on that date")
    ),
    tag = "schedule",
    security(("cookie_auth" = []))
)]
pub async fn annotate_entry(
    State(state): State<Arc<AppState>>,
    Path((person_id, date)): Path<(PersonId, NaiveDate)>,
    auth: AuthenticatedUser,
    Json(input): Json<EntryAnnotation>,
) -> AppResult<Json<ScheduleEntry>> {
    let entry = state.attendance.annotate_entry(&auth.person, person_id, date, &input).await?;
    Ok(Json(entry))
}

/// DELETE /api/schedule/{person_id}/{date} - Remove an entry (admin only)
#[utoipa::path(
    delete,
    path = "/api/schedule/{person_id}/{date}",
    params(
        ("person_id" = i32, Path, description = "Person ID"),
        ("date" = String, Path, description = "Date (YYYY-MM-DD)")
    ),
    responses(
        (status = 200, description = "Entry deleted", body = EntryMutationResponse),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "No entry on that date")
    ),
    tag = "schedule",
    security(("cookie_auth" = []))
)]
pub async fn delete_entry(
    State(state): State<Arc<AppState>>,
    Path((person_id, date)): Path<(PersonId, NaiveDate)>,
    auth: AuthenticatedUser,
) -> AppResult<Json<EntryMutationResponse>> {
    state.attendance.delete_entry(&auth.person, person_id, date).await?;

    Ok(Json(EntryMutationResponse {
        success: true,
        message: Some(format!("Entry for person {} on {} deleted", person_id, date)),
    }))
}
