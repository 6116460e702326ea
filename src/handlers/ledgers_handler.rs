use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::{
    extractors::AuthenticatedUser,
    models::{LeaveLedger, LedgerSummary, PersonId, SetAllowanceInput},
    AppError, AppResult, AppState,
};

/// GET /api/ledgers/{person_id}
#[utoipa::path(
    get,
    path = "/api/ledgers/{person_id}",
    params(
        ("person_id" = i32, Path, description = "Person ID")
    ),
    responses(
        (status = 200, description = "Used, remaining and total leave", body = LedgerSummary),
        (status = 403, description = "Not the caller and not managed by them"),
        (status = 404, description = "Person has no ledger")
    ),
    tag = "ledgers",
    security(("cookie_auth" = []))
)]
pub async fn get_ledger(
    State(state): State<Arc<AppState>>,
    Path(person_id): Path<PersonId>,
    auth: AuthenticatedUser,
) -> AppResult<Json<LedgerSummary>> {
    let summary = state.attendance.ledger_summary(&auth.person, person_id).await?;
    Ok(Json(summary))
}

/// POST /api/ledgers/{person_id} - Open a ledger for a newly registered person
#[utoipa::path(
    post,
    path = "/api/ledgers/{person_id}",
    params(
        ("person_id" = i32, Path, description = "Person ID")
    ),
    responses(
        (status = 200, description = "The person's ledger (existing rows are kept)", body = LeaveLedger),
        (status = 403, description = "Caller is not an administrator"),
        (status = 422, description = "Unknown person")
    ),
    tag = "ledgers",
    security(("cookie_auth" = []))
)]
pub async fn open_ledger(
    State(state): State<Arc<AppState>>,
    Path(person_id): Path<PersonId>,
    auth: AuthenticatedUser,
) -> AppResult<Json<LeaveLedger>> {
    if !auth.person.is_admin {
        return Err(AppError::Forbidden("Only administrators can open ledgers".to_string()));
    }

    let ledger = state.attendance.open_ledger(person_id).await?;
    Ok(Json(ledger))
}

/// PUT /api/ledgers/{person_id}/allowance - Override the total allowance
#[utoipa::path(
    put,
    path = "/api/ledgers/{person_id}/allowance",
    params(
        ("person_id" = i32, Path, description = "Person ID")
    ),
    request_body = SetAllowanceInput,
    responses(
        (status = 200, description = "Updated ledger", body = LedgerSummary),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "Person has no ledger")
    ),
    tag = "ledgers",
    security(("cookie_auth" = []))
)]
pub async fn set_allowance(
    State(state): State<Arc<AppState>>,
    Path(person_id): Path<PersonId>,
    auth: AuthenticatedUser,
    Json(input): Json<SetAllowanceInput>,
) -> AppResult<Json<LedgerSummary>> {
    let summary = state
        .attendance
        .set_allowance(&auth.person, person_id, input.total_leave)
        .await?;
    Ok(Json(summary))
}
