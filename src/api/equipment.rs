//! Equipment endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        equipment::{CreateEquipment, UpdateEquipment},
        Equipment,
    },
    AppState,
};

use super::{operators::ActiveFilter, Authorized};

/// List equipment
#[utoipa::path(
    get,
    path = "/equipment",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(ActiveFilter),
    responses(
        (status = 200, description = "Equipment list", body = Vec<Equipment>)
    )
)]
pub async fn list_equipment(
    State(state): State<AppState>,
    Authorized(_principal): Authorized,
    Query(filter): Query<ActiveFilter>,
) -> AppResult<Json<Vec<Equipment>>> {
    let equipment = state.services.equipment.list(filter.active).await?;
    Ok(Json(equipment))
}

/// Get equipment by code
#[utoipa::path(
    get,
    path = "/equipment/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Equipment code")),
    responses(
        (status = 200, description = "Equipment details", body = Equipment),
        (status = 404, description = "Equipment not found")
    )
)]
pub async fn get_equipment(
    State(state): State<AppState>,
    Authorized(_principal): Authorized,
    Path(id): Path<String>,
) -> AppResult<Json<Equipment>> {
    let equipment = state.services.equipment.get(&id).await?;
    Ok(Json(equipment))
}

/// Create equipment
#[utoipa::path(
    post,
    path = "/equipment",
    tag = "equipment",
    security(("bearer_auth" = [])),
    request_body = CreateEquipment,
    responses(
        (status = 201, description = "Equipment created", body = Equipment),
        (status = 409, description = "Equipment code already exists")
    )
)]
pub async fn create_equipment(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Json(data): Json<CreateEquipment>,
) -> AppResult<(StatusCode, Json<Equipment>)> {
    principal.require_admin()?;
    let equipment = state.services.equipment.create(&data).await?;
    Ok((StatusCode::CREATED, Json(equipment)))
}

/// Update equipment
#[utoipa::path(
    put,
    path = "/equipment/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Equipment code")),
    request_body = UpdateEquipment,
    responses(
        (status = 200, description = "Equipment updated", body = Equipment),
        (status = 404, description = "Equipment not found")
    )
)]
pub async fn update_equipment(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Path(id): Path<String>,
    Json(data): Json<UpdateEquipment>,
) -> AppResult<Json<Equipment>> {
    principal.require_admin()?;
    let equipment = state.services.equipment.update(&id, &data).await?;
    Ok(Json(equipment))
}

/// Take equipment out of service
#[utoipa::path(
    post,
    path = "/equipment/{id}/deactivate",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Equipment code")),
    responses(
        (status = 200, description = "Equipment deactivated", body = Equipment)
    )
)]
pub async fn deactivate_equipment(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Path(id): Path<String>,
) -> AppResult<Json<Equipment>> {
    principal.require_admin()?;
    let equipment = state.services.equipment.deactivate(&id).await?;
    Ok(Json(equipment))
}
