//! Unauthenticated forms: loan applications and work requests

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        assignment_request::{CreateAssignmentRequest, RequestTracking},
        loan::{CreateLoan, LoanTracking},
    },
    AppState,
};

/// Apply for an equipment loan
#[utoipa::path(
    post,
    path = "/public/loans",
    tag = "public",
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Application received; keep the tracking code", body = LoanTracking),
        (status = 400, description = "Invalid application")
    )
)]
pub async fn submit_loan(
    State(state): State<AppState>,
    Json(data): Json<CreateLoan>,
) -> AppResult<(StatusCode, Json<LoanTracking>)> {
    let loan = state.services.loans.submit(&data).await?;
    Ok((StatusCode::CREATED, Json(LoanTracking::from(&loan))))
}

/// Check a loan application
#[utoipa::path(
    get,
    path = "/public/loans/{tracking_code}",
    tag = "public",
    params(("tracking_code" = String, Path, description = "Tracking code")),
    responses(
        (status = 200, description = "Loan status", body = LoanTracking),
        (status = 404, description = "Unknown tracking code")
    )
)]
pub async fn track_loan(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<LoanTracking>> {
    let tracking = state.services.loans.track(&code).await?;
    Ok(Json(tracking))
}

/// Request work from the operations team
#[utoipa::path(
    post,
    path = "/public/requests",
    tag = "public",
    request_body = CreateAssignmentRequest,
    responses(
        (status = 201, description = "Request received; keep the tracking code", body = RequestTracking),
        (status = 400, description = "Invalid request")
    )
)]
pub async fn submit_request(
    State(state): State<AppState>,
    Json(data): Json<CreateAssignmentRequest>,
) -> AppResult<(StatusCode, Json<RequestTracking>)> {
    let request = state.services.requests.submit(&data).await?;
    Ok((StatusCode::CREATED, Json(RequestTracking::from(&request))))
}

/// Check a work request
#[utoipa::path(
    get,
    path = "/public/requests/{tracking_code}",
    tag = "public",
    params(("tracking_code" = String, Path, description = "Tracking code")),
    responses(
        (status = 200, description = "Request status", body = RequestTracking),
        (status = 404, description = "Unknown tracking code")
    )
)]
pub async fn track_request(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<RequestTracking>> {
    let tracking = state.services.requests.track(&code).await?;
    Ok(Json(tracking))
}
