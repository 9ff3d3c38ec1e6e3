//! Operator endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::AppResult,
    models::{
        operator::{CreateOperator, UpdateOperator},
        Operator,
    },
    AppState,
};

use super::Authorized;

/// Catalog list filter shared by operators and equipment
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ActiveFilter {
    /// Only active records
    #[serde(default)]
    pub active: bool,
}

/// List operators
#[utoipa::path(
    get,
    path = "/operators",
    tag = "operators",
    security(("bearer_auth" = [])),
    params(ActiveFilter),
    responses(
        (status = 200, description = "Operators by name", body = Vec<Operator>)
    )
)]
pub async fn list_operators(
    State(state): State<AppState>,
    Authorized(_principal): Authorized,
    Query(filter): Query<ActiveFilter>,
) -> AppResult<Json<Vec<Operator>>> {
    let operators = state.services.operators.list(filter.active).await?;
    Ok(Json(operators))
}

/// Get operator by code
#[utoipa::path(
    get,
    path = "/operators/{id}",
    tag = "operators",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Operator code")),
    responses(
        (status = 200, description = "Operator details", body = Operator),
        (status = 404, description = "Operator not found")
    )
)]
pub async fn get_operator(
    State(state): State<AppState>,
    Authorized(_principal): Authorized,
    Path(id): Path<String>,
) -> AppResult<Json<Operator>> {
    let operator = state.services.operators.get(&id).await?;
    Ok(Json(operator))
}

/// Create an operator
#[utoipa::path(
    post,
    path = "/operators",
    tag = "operators",
    security(("bearer_auth" = [])),
    request_body = CreateOperator,
    responses(
        (status = 201, description = "Operator created", body = Operator),
        (status = 409, description = "Operator code already exists")
    )
)]
pub async fn create_operator(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Json(data): Json<CreateOperator>,
) -> AppResult<(StatusCode, Json<Operator>)> {
    principal.require_admin()?;
    let operator = state.services.operators.create(&data).await?;
    Ok((StatusCode::CREATED, Json(operator)))
}

/// Update an operator
#[utoipa::path(
    put,
    path = "/operators/{id}",
    tag = "operators",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Operator code")),
    request_body = UpdateOperator,
    responses(
        (status = 200, description = "Operator updated", body = Operator),
        (status = 404, description = "Operator not found")
    )
)]
pub async fn update_operator(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Path(id): Path<String>,
    Json(data): Json<UpdateOperator>,
) -> AppResult<Json<Operator>> {
    principal.require_admin()?;
    let operator = state.services.operators.update(&id, &data).await?;
    Ok(Json(operator))
}

/// Deactivate an operator
#[utoipa::path(
    post,
    path = "/operators/{id}/deactivate",
    tag = "operators",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Operator code")),
    responses(
        (status = 200, description = "Operator deactivated", body = Operator)
    )
)]
pub async fn deactivate_operator(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Path(id): Path<String>,
) -> AppResult<Json<Operator>> {
    principal.require_admin()?;
    let operator = state.services.operators.deactivate(&id).await?;
    Ok(Json(operator))
}
