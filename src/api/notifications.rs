//! Manual push notification dispatch

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::notification::{DispatchNotification, DispatchResult},
    AppState,
};

use super::Authorized;

/// Send a push notification to an audience
#[utoipa::path(
    post,
    path = "/notifications/dispatch",
    tag = "notifications",
    security(("bearer_auth" = [])),
    request_body = DispatchNotification,
    responses(
        (status = 200, description = "Dispatch outcome", body = DispatchResult),
        (status = 502, description = "Push gateway failed")
    )
)]
pub async fn dispatch(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Json(notification): Json<DispatchNotification>,
) -> AppResult<Json<DispatchResult>> {
    principal.require_admin()?;
    let result = state.services.notifications.dispatch(&notification).await?;
    Ok(Json(result))
}
