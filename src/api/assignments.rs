//! Assignment endpoints and execution lifecycle

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        assignment::{AddEvidence, AssignmentQuery, CreateAssignment},
        Assignment,
    },
    rules::AssignmentEvent,
    AppState,
};

use super::Authorized;

/// List assignments
#[utoipa::path(
    get,
    path = "/assignments",
    tag = "assignments",
    security(("bearer_auth" = [])),
    params(AssignmentQuery),
    responses(
        (status = 200, description = "Assignments by day", body = Vec<Assignment>)
    )
)]
pub async fn list_assignments(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Query(query): Query<AssignmentQuery>,
) -> AppResult<Json<Vec<Assignment>>> {
    let assignments = state.services.assignments.list(query, &principal).await?;
    Ok(Json(assignments))
}

/// Get an assignment
#[utoipa::path(
    get,
    path = "/assignments/{id}",
    tag = "assignments",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment details", body = Assignment),
        (status = 403, description = "Assigned to another operator"),
        (status = 404, description = "Assignment not found")
    )
)]
pub async fn get_assignment(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Path(id): Path<String>,
) -> AppResult<Json<Assignment>> {
    let assignment = state.services.assignments.get(&id, &principal).await?;
    Ok(Json(assignment))
}

/// Create a pending assignment
#[utoipa::path(
    post,
    path = "/assignments",
    tag = "assignments",
    security(("bearer_auth" = [])),
    request_body = CreateAssignment,
    responses(
        (status = 201, description = "Assignment created", body = Assignment),
        (status = 422, description = "Operator or equipment inactive")
    )
)]
pub async fn create_assignment(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Json(data): Json<CreateAssignment>,
) -> AppResult<(StatusCode, Json<Assignment>)> {
    principal.require_admin()?;
    let assignment = state.services.assignments.create(&data, None).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

/// Delete an assignment that has not started
#[utoipa::path(
    delete,
    path = "/assignments/{id}",
    tag = "assignments",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Assignment ID")),
    responses(
        (status = 204, description = "Assignment deleted"),
        (status = 422, description = "Assignment already started")
    )
)]
pub async fn delete_assignment(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    principal.require_admin()?;
    state.services.assignments.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn transition(
    state: AppState,
    principal: crate::models::Principal,
    id: String,
    event: AssignmentEvent,
) -> AppResult<Json<Assignment>> {
    let assignment = state
        .services
        .assignments
        .transition(&id, event, &principal)
        .await?;
    Ok(Json(assignment))
}

/// Start work on an assignment
#[utoipa::path(
    post,
    path = "/assignments/{id}/start",
    tag = "assignments",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment in progress", body = Assignment),
        (status = 422, description = "Assignment is not pending")
    )
)]
pub async fn start_assignment(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Path(id): Path<String>,
) -> AppResult<Json<Assignment>> {
    transition(state, principal, id, AssignmentEvent::Start).await
}

/// Pause work
#[utoipa::path(
    post,
    path = "/assignments/{id}/pause",
    tag = "assignments",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment paused", body = Assignment),
        (status = 422, description = "Assignment is not in progress")
    )
)]
pub async fn pause_assignment(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Path(id): Path<String>,
) -> AppResult<Json<Assignment>> {
    transition(state, principal, id, AssignmentEvent::Pause).await
}

/// Resume paused work
#[utoipa::path(
    post,
    path = "/assignments/{id}/resume",
    tag = "assignments",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment in progress", body = Assignment),
        (status = 422, description = "Assignment is not paused")
    )
)]
pub async fn resume_assignment(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Path(id): Path<String>,
) -> AppResult<Json<Assignment>> {
    transition(state, principal, id, AssignmentEvent::Resume).await
}

/// Finish work and record its duration
#[utoipa::path(
    post,
    path = "/assignments/{id}/finish",
    tag = "assignments",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment finished", body = Assignment),
        (status = 422, description = "Assignment is not in progress or paused")
    )
)]
pub async fn finish_assignment(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Path(id): Path<String>,
) -> AppResult<Json<Assignment>> {
    transition(state, principal, id, AssignmentEvent::Finish).await
}

/// Attach a field note
#[utoipa::path(
    post,
    path = "/assignments/{id}/evidence",
    tag = "assignments",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Assignment ID")),
    request_body = AddEvidence,
    responses(
        (status = 200, description = "Evidence added", body = Assignment)
    )
)]
pub async fn add_evidence(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Path(id): Path<String>,
    Json(data): Json<AddEvidence>,
) -> AppResult<Json<Assignment>> {
    let assignment = state
        .services
        .assignments
        .add_evidence(&id, &data, &principal)
        .await?;
    Ok(Json(assignment))
}
