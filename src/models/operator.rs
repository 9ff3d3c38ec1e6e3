//! Operator model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::repository::{Collection, Document};

/// Machine operator working at the site
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Operator {
    /// Operator code (also the document id)
    pub id: String,
    pub name: String,
    /// Contact email, used for notifications and reports
    pub email: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Operator {
    const COLLECTION: Collection = Collection::Operators;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Create operator request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOperator {
    #[validate(length(min = 1, max = 32, message = "Operator code must be 1-32 characters"))]
    pub id: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

/// Update operator request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateOperator {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub active: Option<bool>,
}
