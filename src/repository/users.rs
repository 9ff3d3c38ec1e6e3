//! Users, admins and push token queries on Repository

use super::{Filter, Repository};
use crate::{
    error::AppResult,
    models::{AdminRecord, PushToken, UserProfile},
};

impl Repository {
    /// Whether the uid has an admin record
    pub async fn users_is_admin(&self, uid: &str) -> AppResult<bool> {
        Ok(self.get::<AdminRecord>(uid).await?.is_some())
    }

    /// Every admin uid on record
    pub async fn users_admin_uids(&self) -> AppResult<Vec<String>> {
        let admins: Vec<AdminRecord> = self.list(&[]).await?;
        Ok(admins.into_iter().map(|a| a.id).collect())
    }

    /// Active profiles linked to an operator
    pub async fn users_for_operator(&self, operator_id: &str) -> AppResult<Vec<UserProfile>> {
        self.list(&[
            Filter::eq("operator_id", operator_id),
            Filter::eq("active", true),
        ])
        .await
    }

    /// Push tokens registered by one uid
    pub async fn push_tokens_for_uid(&self, uid: &str) -> AppResult<Vec<PushToken>> {
        self.list(&[Filter::eq("uid", uid)]).await
    }
}
