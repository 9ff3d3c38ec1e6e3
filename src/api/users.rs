//! Current user, profiles, admins and push tokens

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{
        notification::RegisterPushToken, user::UpsertUserProfile, AdminRecord, Principal,
        PushToken, UserProfile,
    },
    AppState,
};

use super::Authorized;

/// Role of the caller
#[utoipa::path(
    get,
    path = "/me",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Resolved caller", body = Principal),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Account has no access")
    )
)]
pub async fn me(Authorized(principal): Authorized) -> Json<Principal> {
    Json(principal)
}

/// Create or update the profile of a uid
#[utoipa::path(
    put,
    path = "/users/{uid}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("uid" = String, Path, description = "Identity provider uid")),
    request_body = UpsertUserProfile,
    responses(
        (status = 200, description = "Profile saved", body = UserProfile),
        (status = 404, description = "Linked operator not found")
    )
)]
pub async fn upsert_user(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Path(uid): Path<String>,
    Json(data): Json<UpsertUserProfile>,
) -> AppResult<Json<UserProfile>> {
    principal.require_admin()?;
    let profile = state.services.users.upsert_profile(&uid, &data).await?;
    Ok(Json(profile))
}

/// Make a uid an administrator
#[utoipa::path(
    post,
    path = "/admins/{uid}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("uid" = String, Path, description = "Identity provider uid")),
    responses(
        (status = 200, description = "Administrator record", body = AdminRecord)
    )
)]
pub async fn grant_admin(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Path(uid): Path<String>,
) -> AppResult<Json<AdminRecord>> {
    principal.require_admin()?;
    let record = state.services.users.grant_admin(&uid, None).await?;
    tracing::info!(granted_by = %principal.uid, uid = %uid, "Admin granted");
    Ok(Json(record))
}

/// Register a device for push notifications
#[utoipa::path(
    put,
    path = "/push-tokens",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = RegisterPushToken,
    responses(
        (status = 200, description = "Token registered", body = PushToken)
    )
)]
pub async fn register_push_token(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Json(data): Json<RegisterPushToken>,
) -> AppResult<Json<PushToken>> {
    let token = state
        .services
        .notifications
        .register_token(&principal.uid, &data)
        .await?;
    Ok(Json(token))
}
