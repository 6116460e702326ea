use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;

use crate::{auth, models::Person, AppError, AppState};

/// Extracts JWT token from either __session cookie (frontend) or Authorization header (testing)
fn extract_token_from_request(parts: &Parts) -> Option<String> {
    // Try __session cookie first
    if let Some(cookie_header) = parts.headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            // Parse cookies manually (cookie = "name=value; name2=value2")
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(value) = cookie.strip_prefix("__session=") {
                    return Some(value.to_string());
                }
            }
        }
    }

    // Fallback to Authorization header
    if let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    None
}

/// The acting person, resolved from the session token through the directory
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub person: Person,
}

fn unauthorized(message: String) -> (StatusCode, axum::Json<serde_json::Value>) {
    (StatusCode::UNAUTHORIZED, axum::Json(json!({ "error": message })))
}

impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = (StatusCode, axum::Json<serde_json::Value>);

    fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let token = extract_token_from_request(parts);
        let state = state.clone();

        async move {
            let token = token.ok_or_else(|| {
                unauthorized("Missing authentication: no __session cookie or Authorization header".to_string())
            })?;

            let claims = auth::validate_jwt(&token, &state.config.jwt_secret).map_err(unauthorized)?;
            let person_id = claims.person_id().map_err(unauthorized)?;

            let person = match state.attendance.person(person_id).await {
                Ok(person) => person,
                Err(AppError::Validation(_)) => {
                    tracing::warn!(person_id, "Token subject not found in directory");
                    return Err(unauthorized(format!("Unknown person {}", person_id)));
                }
                Err(e) => {
                    tracing::error!(error = %e, person_id, "Directory lookup failed");
                    return Err((
                        StatusCode::INTERNAL_SERVER_ERROR,
                        axum::Json(json!({ "error": "Directory error" })),
                    ));
                }
            };

            if !person.active {
                tracing::warn!(person_id, "Inactive person attempted access");
                return Err(unauthorized(format!("Person {} is inactive", person_id)));
            }

            tracing::debug!(person_id, "Authenticated");
            Ok(AuthenticatedUser { person })
        }
    }
}
