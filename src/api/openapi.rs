//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{
    assignments, equipment, events, health, loans, notifications, operators, public, reports,
    requests, users, weekly_assignments,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Faena API",
        version = "0.3.0",
        description = "Field operations REST API: operators, equipment, assignments and loans"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    modifiers(&BearerAuth),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Users
        users::me,
        users::upsert_user,
        users::grant_admin,
        users::register_push_token,
        // Operators
        operators::list_operators,
        operators::get_operator,
        operators::create_operator,
        operators::update_operator,
        operators::deactivate_operator,
        // Equipment
        equipment::list_equipment,
        equipment::get_equipment,
        equipment::create_equipment,
        equipment::update_equipment,
        equipment::deactivate_equipment,
        // Weekly bindings
        weekly_assignments::list_weekly_assignments,
        weekly_assignments::get_weekly_assignment,
        weekly_assignments::create_weekly_assignment,
        weekly_assignments::update_weekly_assignment,
        weekly_assignments::deactivate_weekly_assignment,
        weekly_assignments::activate_weekly_assignment,
        // Assignments
        assignments::list_assignments,
        assignments::get_assignment,
        assignments::create_assignment,
        assignments::delete_assignment,
        assignments::start_assignment,
        assignments::pause_assignment,
        assignments::resume_assignment,
        assignments::finish_assignment,
        assignments::add_evidence,
        // Loans
        loans::list_loans,
        loans::get_loan,
        loans::approve_loan,
        loans::deliver_loan,
        loans::return_loan,
        loans::reject_loan,
        // Requests
        requests::list_requests,
        requests::get_request,
        requests::approve_request,
        requests::reject_request,
        // Public
        public::submit_loan,
        public::track_loan,
        public::submit_request,
        public::track_request,
        // Notifications, reports and change feed
        notifications::dispatch,
        reports::preview_daily,
        reports::send_daily,
        events::stream_events,
    ),
    components(
        schemas(
            // Catalog
            crate::models::Operator,
            crate::models::operator::CreateOperator,
            crate::models::operator::UpdateOperator,
            crate::models::Equipment,
            crate::models::equipment::CreateEquipment,
            crate::models::equipment::UpdateEquipment,
            // Bindings
            crate::models::WeeklyAssignment,
            crate::models::weekly_assignment::CreateWeeklyAssignment,
            crate::models::weekly_assignment::UpdateWeeklyAssignment,
            crate::models::Shift,
            crate::models::BindingStatus,
            // Assignments
            crate::models::Assignment,
            crate::models::EvidenceNote,
            crate::models::AssignmentStatus,
            crate::models::assignment::CreateAssignment,
            crate::models::assignment::AddEvidence,
            // Loans
            crate::models::EquipmentLoan,
            crate::models::Attestation,
            crate::models::LoanStatus,
            crate::models::loan::ApproveLoan,
            crate::models::loan::ReturnLoan,
            crate::models::loan::RejectLoan,
            crate::models::loan::CreateLoan,
            crate::models::loan::LoanTracking,
            // Requests
            crate::models::AssignmentRequest,
            crate::models::RequestStatus,
            crate::models::assignment_request::CreateAssignmentRequest,
            crate::models::assignment_request::AssignmentSlot,
            crate::models::assignment_request::ApproveAssignmentRequest,
            crate::models::assignment_request::RejectAssignmentRequest,
            crate::models::assignment_request::RequestTracking,
            // Users
            crate::models::Principal,
            crate::models::Role,
            crate::models::UserProfile,
            crate::models::AdminRecord,
            crate::models::user::UpsertUserProfile,
            // Notifications
            crate::models::PushToken,
            crate::models::notification::RegisterPushToken,
            crate::models::notification::Audience,
            crate::models::notification::DispatchNotification,
            crate::models::notification::DispatchResult,
            // Reports
            crate::services::reports::DailyReport,
            crate::services::reports::ReportDelivery,
            reports::SendReportRequest,
            // Change feed
            crate::repository::ChangeEvent,
            crate::repository::ChangeKind,
            crate::repository::Collection,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "Caller, profiles and administrators"),
        (name = "operators", description = "Operator catalog"),
        (name = "equipment", description = "Equipment catalog"),
        (name = "weekly-assignments", description = "Operator/equipment bindings"),
        (name = "assignments", description = "Daily assignments and their execution"),
        (name = "loans", description = "Equipment loan management"),
        (name = "requests", description = "Assignment request review"),
        (name = "public", description = "Public forms and tracking"),
        (name = "notifications", description = "Push notifications"),
        (name = "reports", description = "Daily reports"),
        (name = "events", description = "Change feed")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_lifecycle_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/assignments/{id}/finish"));
        assert!(doc.paths.paths.contains_key("/public/loans/{tracking_code}"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
