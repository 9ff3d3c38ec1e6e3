//! Equipment loan management endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{
        loan::{ApproveLoan, LoanQuery, RejectLoan, ReturnLoan},
        Attestation, EquipmentLoan,
    },
    AppState,
};

use super::Authorized;

/// List loans, newest first
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(LoanQuery),
    responses(
        (status = 200, description = "Loans", body = Vec<EquipmentLoan>)
    )
)]
pub async fn list_loans(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Query(query): Query<LoanQuery>,
) -> AppResult<Json<Vec<EquipmentLoan>>> {
    principal.require_admin()?;
    let loans = state.services.loans.list(&query).await?;
    Ok(Json(loans))
}

/// Get a loan
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan details", body = EquipmentLoan),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Path(id): Path<String>,
) -> AppResult<Json<EquipmentLoan>> {
    principal.require_admin()?;
    let loan = state.services.loans.get(&id).await?;
    Ok(Json(loan))
}

/// Approve a loan for a time window
#[utoipa::path(
    post,
    path = "/loans/{id}/approve",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Loan ID")),
    request_body = ApproveLoan,
    responses(
        (status = 200, description = "Loan approved", body = EquipmentLoan),
        (status = 400, description = "Window ends before it starts"),
        (status = 409, description = "Equipment lent to someone else in that window"),
        (status = 422, description = "Loan is not pending")
    )
)]
pub async fn approve_loan(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Path(id): Path<String>,
    Json(data): Json<ApproveLoan>,
) -> AppResult<Json<EquipmentLoan>> {
    principal.require_admin()?;
    let loan = state.services.loans.approve(&id, &data).await?;
    Ok(Json(loan))
}

/// Record delivery of the equipment
#[utoipa::path(
    post,
    path = "/loans/{id}/deliver",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Loan ID")),
    request_body = Attestation,
    responses(
        (status = 200, description = "Equipment delivered", body = EquipmentLoan),
        (status = 422, description = "Loan is not approved")
    )
)]
pub async fn deliver_loan(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Path(id): Path<String>,
    Json(attestation): Json<Attestation>,
) -> AppResult<Json<EquipmentLoan>> {
    principal.require_admin()?;
    let loan = state.services.loans.deliver(&id, attestation).await?;
    Ok(Json(loan))
}

/// Record return of the equipment
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Loan ID")),
    request_body = ReturnLoan,
    responses(
        (status = 200, description = "Equipment returned", body = EquipmentLoan),
        (status = 422, description = "Equipment was never delivered")
    )
)]
pub async fn return_loan(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Path(id): Path<String>,
    Json(data): Json<ReturnLoan>,
) -> AppResult<Json<EquipmentLoan>> {
    principal.require_admin()?;
    let loan = state.services.loans.return_loan(&id, data).await?;
    Ok(Json(loan))
}

/// Reject a pending loan
#[utoipa::path(
    post,
    path = "/loans/{id}/reject",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Loan ID")),
    request_body = RejectLoan,
    responses(
        (status = 200, description = "Loan rejected", body = EquipmentLoan),
        (status = 422, description = "Loan is not pending")
    )
)]
pub async fn reject_loan(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Path(id): Path<String>,
    Json(data): Json<RejectLoan>,
) -> AppResult<Json<EquipmentLoan>> {
    principal.require_admin()?;
    let loan = state.services.loans.reject(&id, data).await?;
    Ok(Json(loan))
}
