use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{handlers, openapi::ApiDoc};

/// Base64 proof images are about a third larger than the file itself
const PROOF_BODY_LIMIT: usize = 16 * 1024 * 1024;

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true);

    match origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            tracing::warn!(error = %e, origin, "Invalid CORS_ORIGIN, cross-origin requests will be refused");
            cors
        }
    }
}

pub fn build_router(state: Arc<crate::AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origin);

    // Attendance routes
    let attendance_routes = Router::new()
        .route(
            "/proofs",
            post(handlers::proofs_handler::upload_proof).layer(DefaultBodyLimit::max(PROOF_BODY_LIMIT)),
        )
        .route("/proofs/{person_id}/{date}", get(handlers::proofs_handler::get_proof_image))
        .route("/log", get(handlers::proofs_handler::get_person_log));

    // Schedule routes
    let schedule_routes = Router::new()
        .route("/", post(handlers::schedule_handler::mutate_schedule))
        .route("/calendar", get(handlers::schedule_handler::get_calendar))
        .route("/bulk-default", post(handlers::schedule_handler::bulk_default))
        .route(
            "/{person_id}/{date}",
            put(handlers::schedule_handler::annotate_entry).delete(handlers::schedule_handler::delete_entry),
        );

    // Change request routes
    let request_routes = Router::new()
        .route("/pending", get(handlers::requests_handler::get_pending_requests))
        .route("/{id}/decision", post(handlers::requests_handler::decide_request));

    // Work type routes
    let work_type_routes = Router::new()
        .route(
            "/",
            get(handlers::work_types_handler::get_work_types).post(handlers::work_types_handler::create_work_type),
        )
        .route("/seed", post(handlers::work_types_handler::seed_work_types))
        .route(
            "/{id}",
            put(handlers::work_types_handler::update_work_type).delete(handlers::work_types_handler::delete_work_type),
        );

    // Ledger routes
    let ledger_routes = Router::new()
        .route(
            "/{person_id}",
            get(handlers::ledgers_handler::get_ledger).post(handlers::ledgers_handler::open_ledger),
        )
        .route("/{person_id}/allowance", put(handlers::ledgers_handler::set_allowance));

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
        )
    });

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .nest("/api/attendance", attendance_routes)
        .nest("/api/schedule", schedule_routes)
        .nest("/api/requests", request_routes)
        .nest("/api/work-types", work_type_routes)
        .nest("/api/ledgers", ledger_routes)
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(middleware::from_fn(crate::middleware::metrics_middleware))
        .layer(middleware::from_fn(crate::middleware::request_id_middleware))
        .layer(trace)
        .layer(cors)
        .with_state(state)
}
