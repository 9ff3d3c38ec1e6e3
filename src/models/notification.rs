//! Push token and notification dispatch types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::repository::{Collection, Document};

/// Device push token registered by a signed-in user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PushToken {
    /// The token itself is the document id
    pub id: String,
    pub uid: String,
    pub platform: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Document for PushToken {
    const COLLECTION: Collection = Collection::PushTokens;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Register push token request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterPushToken {
    #[validate(length(min = 8, max = 512, message = "Invalid push token"))]
    pub token: String,
    pub platform: Option<String>,
}

/// Who receives a notification
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Audience {
    /// Every administrator
    Admins,
    /// Users linked to one operator
    Operator { operator_id: String },
}

/// Notification to send through the push gateway
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct DispatchNotification {
    pub audience: Audience,
    #[validate(length(min = 1, max = 120, message = "Title must be 1-120 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 1000, message = "Body must be 1-1000 characters"))]
    pub body: String,
    pub data: Option<serde_json::Value>,
}

/// Outcome of a dispatch
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct DispatchResult {
    pub success: bool,
    pub sent: usize,
    pub failed: usize,
}
