//! API handlers for Faena REST endpoints

pub mod assignments;
pub mod equipment;
pub mod events;
pub mod health;
pub mod loans;
pub mod notifications;
pub mod openapi;
pub mod operators;
pub mod public;
pub mod reports;
pub mod requests;
pub mod users;
pub mod weekly_assignments;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::Principal, AppState};

/// Extractor for an authenticated caller with a resolved role
pub struct Authorized(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for Authorized {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Get the Authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = state.services.users.verify_token(token)?;
        let principal = state.services.users.authorize(&claims.sub, claims.email).await?;

        Ok(Authorized(principal))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/me", get(users::me))
        // Operators
        .route("/operators", get(operators::list_operators).post(operators::create_operator))
        .route("/operators/:id", get(operators::get_operator).put(operators::update_operator))
        .route("/operators/:id/deactivate", post(operators::deactivate_operator))
        // Equipment
        .route("/equipment", get(equipment::list_equipment).post(equipment::create_equipment))
        .route("/equipment/:id", get(equipment::get_equipment).put(equipment::update_equipment))
        .route("/equipment/:id/deactivate", post(equipment::deactivate_equipment))
        // Weekly bindings
        .route(
            "/weekly-assignments",
            get(weekly_assignments::list_weekly_assignments)
                .post(weekly_assignments::create_weekly_assignment),
        )
        .route(
            "/weekly-assignments/:id",
            get(weekly_assignments::get_weekly_assignment)
                .put(weekly_assignments::update_weekly_assignment),
        )
        .route(
            "/weekly-assignments/:id/deactivate",
            post(weekly_assignments::deactivate_weekly_assignment),
        )
        .route(
            "/weekly-assignments/:id/activate",
            post(weekly_assignments::activate_weekly_assignment),
        )
        // Assignments
        .route(
            "/assignments",
            get(assignments::list_assignments).post(assignments::create_assignment),
        )
        .route(
            "/assignments/:id",
            get(assignments::get_assignment).delete(assignments::delete_assignment),
        )
        .route("/assignments/:id/start", post(assignments::start_assignment))
        .route("/assignments/:id/pause", post(assignments::pause_assignment))
        .route("/assignments/:id/resume", post(assignments::resume_assignment))
        .route("/assignments/:id/finish", post(assignments::finish_assignment))
        .route("/assignments/:id/evidence", post(assignments::add_evidence))
        // Loans
        .route("/loans", get(loans::list_loans))
        .route("/loans/:id", get(loans::get_loan))
        .route("/loans/:id/approve", post(loans::approve_loan))
        .route("/loans/:id/deliver", post(loans::deliver_loan))
        .route("/loans/:id/return", post(loans::return_loan))
        .route("/loans/:id/reject", post(loans::reject_loan))
        // Requests
        .route("/requests", get(requests::list_requests))
        .route("/requests/:id", get(requests::get_request))
        .route("/requests/:id/approve", post(requests::approve_request))
        .route("/requests/:id/reject", post(requests::reject_request))
        // Public forms
        .route("/public/loans", post(public::submit_loan))
        .route("/public/loans/:tracking_code", get(public::track_loan))
        .route("/public/requests", post(public::submit_request))
        .route("/public/requests/:tracking_code", get(public::track_request))
        // Users
        .route("/users/:uid", put(users::upsert_user))
        .route("/admins/:uid", post(users::grant_admin))
        .route("/push-tokens", put(users::register_push_token))
        // Notifications and reports
        .route("/notifications/dispatch", post(notifications::dispatch))
        .route("/reports/daily", get(reports::preview_daily))
        .route("/reports/daily/send", post(reports::send_daily))
        // Change feed
        .route("/events", get(events::stream_events))
        .with_state(state);

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
