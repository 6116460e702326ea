use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::{
    extractors::AuthenticatedUser,
    models::{CreateWorkTypeInput, UpdateWorkTypeInput, WorkType, WorkTypeId, WorkTypeMutationResponse},
    AppError, AppResult, AppState,
};

/// GET /api/work-types
#[utoipa::path(
    get,
    path = "/api/work-types",
    responses(
        (status = 200, description = "Work type catalog in display order", body = Vec<WorkType>)
    ),
    tag = "work-types",
    security(("cookie_auth" = []))
)]
pub async fn get_work_types(
    State(state): State<Arc<AppState>>,
    _auth: AuthenticatedUser,
) -> AppResult<Json<Vec<WorkType>>> {
    let work_types = state.attendance.list_work_types().await?;
    Ok(Json(work_types))
}

/// POST /api/work-types - Create a new work type
#[utoipa::path(
    post,
    path = "/api/work-types",
    request_body = CreateWorkTypeInput,
    responses(
        (status = 200, description = "Work type created", body = WorkType),
        (status = 403, description = "Caller is not an administrator"),
        (status = 409, description = "Name already in use")
    ),
    tag = "work-types",
    security(("cookie_auth" = []))
)]
pub async fn create_work_type(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Json(input): Json<CreateWorkTypeInput>,
) -> AppResult<Json<WorkType>> {
    let work_type = state.attendance.create_work_type(&auth.person, &input).await?;
    Ok(Json(work_type))
}

/// PUT /api/work-types/{id} - Update a work type; weight changes reconcile ledgers
#[utoipa::path(
    put,
    path = "/api/work-types/{id}",
    params(
        ("id" = i32, Path, description = "Work type ID")
    ),
    request_body = UpdateWorkTypeInput,
    responses(
        (status = 200, description = "Work type updated", body = WorkType),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "Work type not found")
    ),
    tag = "work-types",
    security(("cookie_auth" = []))
)]
pub async fn update_work_type(
    State(state): State<Arc<AppState>>,
    Path(id): Path<WorkTypeId>,
    auth: AuthenticatedUser,
    Json(input): Json<UpdateWorkTypeInput>,
) -> AppResult<Json<WorkType>> {
    let work_type = state.attendance.update_work_type(&auth.person, id, &input).await?;
    Ok(Json(work_type))
}

/// DELETE /api/work-types/{id} - Delete a work type; entries keep their dates untyped
#[utoipa::path(
    delete,
    path = "/api/work-types/{id}",
    params(
        ("id" = i32, Path, description = "Work type ID")
    ),
    responses(
        (status = 200, description = "Work type deleted", body = WorkTypeMutationResponse),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "Work type not found")
    ),
    tag = "work-types",
    security(("cookie_auth" = []))
)]
pub async fn delete_work_type(
    State(state): State<Arc<AppState>>,
    Path(id): Path<WorkTypeId>,
    auth: AuthenticatedUser,
) -> AppResult<Json<WorkTypeMutationResponse>> {
    state.attendance.delete_work_type(&auth.person, id).await?;

    Ok(Json(WorkTypeMutationResponse {
        success: true,
        message: Some(format!("Work type {} deleted", id)),
    }))
}

/// POST /api/work-types/seed - Add any missing standard work types
#[utoipa::path(
    post,
    path = "/api/work-types/seed",
    responses(
        (status = 200, description = "Number of work types added", body = WorkTypeMutationResponse),
        (status = 403, description = "Caller is not an administrator")
    ),
    tag = "work-types",
    security(("cookie_auth" = []))
)]
pub async fn seed_work_types(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> AppResult<Json<WorkTypeMutationResponse>> {
    if !auth.person.is_admin {
        return Err(AppError::Forbidden("Only administrators can seed work types".to_string()));
    }

    let inserted = state.attendance.seed_standard_work_types().await?;

    Ok(Json(WorkTypeMutationResponse {
        success: true,
        message: Some(format!("{} work types added", inserted)),
    }))
}
