//! Weekly binding endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        weekly_assignment::{CreateWeeklyAssignment, UpdateWeeklyAssignment, WeeklyAssignmentQuery},
        WeeklyAssignment,
    },
    AppState,
};

use super::Authorized;

/// List weekly bindings
#[utoipa::path(
    get,
    path = "/weekly-assignments",
    tag = "weekly-assignments",
    security(("bearer_auth" = [])),
    params(WeeklyAssignmentQuery),
    responses(
        (status = 200, description = "Bindings intersecting the filters", body = Vec<WeeklyAssignment>)
    )
)]
pub async fn list_weekly_assignments(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Query(query): Query<WeeklyAssignmentQuery>,
) -> AppResult<Json<Vec<WeeklyAssignment>>> {
    let bindings = state.services.weekly_assignments.list(query, &principal).await?;
    Ok(Json(bindings))
}

/// Get a weekly binding
#[utoipa::path(
    get,
    path = "/weekly-assignments/{id}",
    tag = "weekly-assignments",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Binding ID")),
    responses(
        (status = 200, description = "Binding details", body = WeeklyAssignment),
        (status = 404, description = "Binding not found")
    )
)]
pub async fn get_weekly_assignment(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Path(id): Path<String>,
) -> AppResult<Json<WeeklyAssignment>> {
    let binding = state.services.weekly_assignments.get(&id, &principal).await?;
    Ok(Json(binding))
}

/// Bind an operator to equipment for a period
#[utoipa::path(
    post,
    path = "/weekly-assignments",
    tag = "weekly-assignments",
    security(("bearer_auth" = [])),
    request_body = CreateWeeklyAssignment,
    responses(
        (status = 201, description = "Binding created", body = WeeklyAssignment),
        (status = 400, description = "End date before start date"),
        (status = 409, description = "Equipment already bound in that period")
    )
)]
pub async fn create_weekly_assignment(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Json(data): Json<CreateWeeklyAssignment>,
) -> AppResult<(StatusCode, Json<WeeklyAssignment>)> {
    principal.require_admin()?;
    let binding = state.services.weekly_assignments.create(&data).await?;
    Ok((StatusCode::CREATED, Json(binding)))
}

/// Change dates, shift or notes of a binding
#[utoipa::path(
    put,
    path = "/weekly-assignments/{id}",
    tag = "weekly-assignments",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Binding ID")),
    request_body = UpdateWeeklyAssignment,
    responses(
        (status = 200, description = "Binding updated", body = WeeklyAssignment),
        (status = 409, description = "Equipment already bound in that period")
    )
)]
pub async fn update_weekly_assignment(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Path(id): Path<String>,
    Json(data): Json<UpdateWeeklyAssignment>,
) -> AppResult<Json<WeeklyAssignment>> {
    principal.require_admin()?;
    let binding = state.services.weekly_assignments.update(&id, &data).await?;
    Ok(Json(binding))
}

/// Deactivate a binding
#[utoipa::path(
    post,
    path = "/weekly-assignments/{id}/deactivate",
    tag = "weekly-assignments",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Binding ID")),
    responses(
        (status = 200, description = "Binding deactivated", body = WeeklyAssignment)
    )
)]
pub async fn deactivate_weekly_assignment(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Path(id): Path<String>,
) -> AppResult<Json<WeeklyAssignment>> {
    principal.require_admin()?;
    let binding = state.services.weekly_assignments.deactivate(&id).await?;
    Ok(Json(binding))
}

/// Reactivate a binding
#[utoipa::path(
    post,
    path = "/weekly-assignments/{id}/activate",
    tag = "weekly-assignments",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Binding ID")),
    responses(
        (status = 200, description = "Binding active again", body = WeeklyAssignment),
        (status = 409, description = "Equipment taken in the meantime")
    )
)]
pub async fn activate_weekly_assignment(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Path(id): Path<String>,
) -> AppResult<Json<WeeklyAssignment>> {
    principal.require_admin()?;
    let binding = state.services.weekly_assignments.activate(&id).await?;
    Ok(Json(binding))
}
