use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::Modify;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance API",
        version = "1.0.0",
        description = "Trainee attendance verification, schedules, leave ledgers and change requests"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    paths(
        // Health
        crate::handlers::health::health_check,
        crate::handlers::metrics::metrics_handler,

        // Attendance
        crate::handlers::proofs_handler::upload_proof,
        crate::handlers::proofs_handler::get_proof_image,
        crate::handlers::proofs_handler::get_person_log,

        // Schedule
        crate::handlers::schedule_handler::get_calendar,
        crate::handlers::schedule_handler::mutate_schedule,
        crate::handlers::schedule_handler::bulk_default,
        crate::handlers::schedule_handler::annotate_entry,
        crate::handlers::schedule_handler::delete_entry,

        // Change requests
        crate::handlers::requests_handler::get_pending_requests,
        crate::handlers::requests_handler::decide_request,

        // Work types
        crate::handlers::work_types_handler::get_work_types,
        crate::handlers::work_types_handler::create_work_type,
        crate::handlers::work_types_handler::update_work_type,
        crate::handlers::work_types_handler::delete_work_type,
        crate::handlers::work_types_handler::seed_work_types,

        // Ledgers
        crate::handlers::ledgers_handler::get_ledger,
        crate::handlers::ledgers_handler::open_ledger,
        crate::handlers::ledgers_handler::set_allowance,
    ),
    components(
        schemas(
            crate::models::Person,
            crate::models::RosterRole,
            crate::models::WorkType,
            crate::models::CreateWorkTypeInput,
            crate::models::UpdateWorkTypeInput,
            crate::models::WorkTypeMutationResponse,
            crate::models::ScheduleEntry,
            crate::models::EntryAnnotation,
            crate::models::EntryMutationResponse,
            crate::models::UpdateScheduleInput,
            crate::models::ScheduleMutationOutcome,
            crate::models::BulkApplyInput,
            crate::models::BulkApplyResponse,
            crate::models::UploadProofInput,
            crate::models::UploadProofResponse,
            crate::models::Verdict,
            crate::models::ChangeRequest,
            crate::models::ChangeRequestWithDetails,
            crate::models::RequestStatus,
            crate::models::DecisionAction,
            crate::models::DecisionInput,
            crate::models::LeaveLedger,
            crate::models::LedgerSummary,
            crate::models::SetAllowanceInput,
            crate::models::MonthCalendar,
            crate::models::CalendarDay,
            crate::models::CalendarCell,
            crate::models::CalendarRow,
            crate::models::MonthlyCounts,
        )
    ),
    tags(
        (name = "health", description = "Health check and metrics"),
        (name = "attendance", description = "Attendance proofs and logs"),
        (name = "schedule", description = "Daily schedules"),
        (name = "requests", description = "Schedule change requests"),
        (name = "work-types", description = "Work type catalog"),
        (name = "ledgers", description = "Leave ledgers"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("__session"))),
            )
        }
    }
}
