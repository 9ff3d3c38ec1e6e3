//! Authorization and user profile service

use chrono::Utc;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        user::UpsertUserProfile, AdminRecord, Operator, Principal, Role, UserClaims, UserProfile,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Validate a bearer token issued by the identity provider
    pub fn verify_token(&self, token: &str) -> AppResult<UserClaims> {
        UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|_| AppError::Authentication("Invalid or expired token".to_string()))
    }

    /// Resolve the role of an authenticated uid.
    ///
    /// Admins come from configuration or the admins collection. Any other uid
    /// needs an active profile linked to an active operator.
    pub async fn authorize(&self, uid: &str, email: Option<String>) -> AppResult<Principal> {
        if self.config.admin_uids.iter().any(|a| a == uid) || self.repository.users_is_admin(uid).await? {
            return Ok(Principal { uid: uid.to_string(), email, role: Role::Admin });
        }

        let denied = || AppError::Authorization("Account has no access".to_string());

        let profile = self.repository.get::<UserProfile>(uid).await?.ok_or_else(denied)?;
        if !profile.active {
            return Err(denied());
        }
        let operator_id = profile.operator_id.ok_or_else(denied)?;
        let operator = self.repository.get::<Operator>(&operator_id).await?.ok_or_else(denied)?;
        if !operator.active {
            return Err(denied());
        }

        Ok(Principal {
            uid: uid.to_string(),
            email: email.or(profile.email),
            role: Role::Operator { operator_id },
        })
    }

    pub async fn get_profile(&self, uid: &str) -> AppResult<UserProfile> {
        self.repository.fetch(uid).await
    }

    /// Create or update the profile of a uid
    pub async fn upsert_profile(&self, uid: &str, data: &UpsertUserProfile) -> AppResult<UserProfile> {
        data.validate()?;
        if let Some(ref operator_id) = data.operator_id {
            // Linking to an unknown operator would lock the user out
            self.repository.fetch::<Operator>(operator_id).await?;
        }

        let existing = self.repository.get::<UserProfile>(uid).await?;
        let profile = match existing {
            Some(mut profile) => {
                if data.email.is_some() {
                    profile.email = data.email.clone();
                }
                if data.display_name.is_some() {
                    profile.display_name = data.display_name.clone();
                }
                if data.operator_id.is_some() {
                    profile.operator_id = data.operator_id.clone();
                }
                if let Some(active) = data.active {
                    profile.active = active;
                }
                profile.updated_at = Utc::now();
                profile
            }
            None => UserProfile {
                id: uid.to_string(),
                email: data.email.clone(),
                display_name: data.display_name.clone(),
                operator_id: data.operator_id.clone(),
                active: data.active.unwrap_or(true),
                updated_at: Utc::now(),
            },
        };

        self.repository.put(&profile).await?;
        tracing::info!(uid, operator_id = ?profile.operator_id, "User profile saved");
        Ok(profile)
    }

    /// Make a uid an administrator
    pub async fn grant_admin(&self, uid: &str, email: Option<String>) -> AppResult<AdminRecord> {
        if let Some(existing) = self.repository.get::<AdminRecord>(uid).await? {
            return Ok(existing);
        }
        let record = AdminRecord {
            id: uid.to_string(),
            email,
            granted_at: Utc::now(),
        };
        self.repository.put(&record).await?;
        tracing::info!(uid, "Administrator granted");
        Ok(record)
    }
}
