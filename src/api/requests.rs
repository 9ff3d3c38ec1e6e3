//! Assignment request review endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{
        assignment_request::{ApproveAssignmentRequest, RejectAssignmentRequest, RequestQuery},
        AssignmentRequest,
    },
    AppState,
};

use super::Authorized;

/// List requests, newest first
#[utoipa::path(
    get,
    path = "/requests",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(RequestQuery),
    responses(
        (status = 200, description = "Requests", body = Vec<AssignmentRequest>)
    )
)]
pub async fn list_requests(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Query(query): Query<RequestQuery>,
) -> AppResult<Json<Vec<AssignmentRequest>>> {
    principal.require_admin()?;
    let requests = state.services.requests.list(&query).await?;
    Ok(Json(requests))
}

/// Get a request
#[utoipa::path(
    get,
    path = "/requests/{id}",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request details", body = AssignmentRequest),
        (status = 404, description = "Request not found")
    )
)]
pub async fn get_request(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Path(id): Path<String>,
) -> AppResult<Json<AssignmentRequest>> {
    principal.require_admin()?;
    let request = state.services.requests.get(&id).await?;
    Ok(Json(request))
}

/// Approve a request, creating one assignment per slot
#[utoipa::path(
    post,
    path = "/requests/{id}/approve",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Request ID")),
    request_body = ApproveAssignmentRequest,
    responses(
        (status = 200, description = "Request approved", body = AssignmentRequest),
        (status = 400, description = "No slots given"),
        (status = 422, description = "Request already decided")
    )
)]
pub async fn approve_request(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Path(id): Path<String>,
    Json(data): Json<ApproveAssignmentRequest>,
) -> AppResult<Json<AssignmentRequest>> {
    principal.require_admin()?;
    let request = state.services.requests.approve(&id, &data).await?;
    Ok(Json(request))
}

/// Reject a request
#[utoipa::path(
    post,
    path = "/requests/{id}/reject",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Request ID")),
    request_body = RejectAssignmentRequest,
    responses(
        (status = 200, description = "Request rejected", body = AssignmentRequest),
        (status = 422, description = "Request already decided")
    )
)]
pub async fn reject_request(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Path(id): Path<String>,
    Json(data): Json<RejectAssignmentRequest>,
) -> AppResult<Json<AssignmentRequest>> {
    principal.require_admin()?;
    let request = state.services.requests.reject(&id, data).await?;
    Ok(Json(request))
}
