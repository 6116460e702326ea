use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::{
    extractors::AuthenticatedUser,
    models::{ChangeRequest, ChangeRequestWithDetails, DecisionInput, RequestId},
    AppResult, AppState,
};

/// GET /api/requests/pending - Pending change requests the caller may decide
#[utoipa::path(
    get,
    path = "/api/requests/pending",
    responses(
        (status = 200, description = "Pending requests, oldest first", body = Vec<ChangeRequestWithDetails>)
    ),
    tag = "requests",
    security(("cookie_auth" = []))
)]
pub async fn get_pending_requests(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> AppResult<Json<Vec<ChangeRequestWithDetails>>> {
    let requests = state.attendance.list_pending_requests(&auth.person).await?;
    Ok(Json(requests))
}

/// POST /api/requests/{id}/decision - Approve or reject a pending request
#[utoipa::path(
    post,
    path = "/api/requests/{id}/decision",
    params(
        ("id" = i32, Path, description = "Change request ID")
    ),
    request_body = DecisionInput,
    responses(
        (status = 200, description = "Settled request", body = ChangeRequest),
        (status = 403, description = "Caller may not decide this request"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already settled")
    ),
    tag = "requests",
    security(("cookie_auth" = []))
)]
pub async fn decide_request(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<RequestId>,
    auth: AuthenticatedUser,
    Json(input): Json<DecisionInput>,
) -> AppResult<Json<ChangeRequest>> {
    let request = state
        .attendance
        .decide_request(&auth.person, request_id, input.action)
        .await?;
    Ok(Json(request))
}
