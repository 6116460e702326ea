use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::{
    extractors::AuthenticatedUser,
    models::{PersonId, ScheduleEntry, UploadProofInput, UploadProofResponse},
    AppError, AppResult, AppState,
};

/// Decodes a base64 image, accepting an optional `data:<mime>;base64,` prefix
fn decode_image(encoded: &str) -> AppResult<Vec<u8>> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };

    STANDARD
        .decode(payload.trim())
        .map_err(|e| AppError::BadRequest(format!("Image is not valid base64: {}", e)))
}

/// POST /api/attendance/proofs - Submit today's attendance proof image
#[utoipa::path(
    post,
    path = "/api/attendance/proofs",
    request_body = UploadProofInput,
    responses(
        (status = 200, description = "Verdict and today's schedule entry", body = UploadProofResponse),
        (status = 400, description = "Image is not valid base64"),
        (status = 422, description = "Empty image")
    ),
    tag = "attendance",
    security(("cookie_auth" = []))
)]
pub async fn upload_proof(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Json(input): Json<UploadProofInput>,
) -> AppResult<Json<UploadProofResponse>> {
    let image = decode_image(&input.image)?;

    tracing::debug!(person_id = auth.person.id, bytes = image.len(), "Proof upload received");

    let response = state.attendance.upload_proof(auth.person.id, &image).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LogQuery {
    /// Defaults to the caller
    #[serde(rename = "personId")]
    pub person_id: Option<PersonId>,
}

/// GET /api/attendance/log?personId=
#[utoipa::path(
    get,
    path = "/api/attendance/log",
    params(LogQuery),
    responses(
        (status = 200, description = "Schedule entries, newest first", body = Vec<ScheduleEntry>),
        (status = 403, description = "Not the caller and not managed by them")
    ),
    tag = "attendance",
    security(("cookie_auth" = []))
)]
pub async fn get_person_log(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedUser,
    Query(query): Query<LogQuery>,
) -> AppResult<Json<Vec<ScheduleEntry>>> {
    let person_id = query.person_id.unwrap_or(auth.person.id);
    let entries = state.attendance.person_log(&auth.person, person_id).await?;
    Ok(Json(entries))
}

/// GET /api/attendance/proofs/{person_id}/{date} - Stored proof image
#[utoipa::path(
    get,
    path = "/api/attendance/proofs/{person_id}/{date}",
    params(
        ("person_id" = i32, Path, description = "Person ID"),
        ("date" = String, Path, description = "Date (YYYY-MM-DD)")
    ),
    responses(
        (status = 200, description = "Image bytes as uploaded", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 403, description = "Not the caller and not managed by them"),
        (status = 404, description = "No proof stored for that day")
    ),
    tag = "attendance",
    security(("cookie_auth" = []))
)]
pub async fn get_proof_image(
    State(state): State<Arc<AppState>>,
    Path((person_id, date)): Path<(PersonId, NaiveDate)>,
    auth: AuthenticatedUser,
) -> AppResult<impl IntoResponse> {
    let bytes = state.attendance.proof_image(&auth.person, person_id, date).await?;
    let content_type = image::guess_format(&bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream");

    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_base64() {
        assert_eq!(decode_image("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_data_url() {
        assert_eq!(decode_image("data:image/png;base64,aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_image("not base64!"), Err(AppError::BadRequest(_))));
    }
}
