//! Equipment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::repository::{Collection, Document};

/// Equipment unit (truck, loader, drill, ...)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Equipment {
    /// Equipment code (also the document id)
    pub id: String,
    /// Equipment name / description
    pub name: String,
    /// Free-form kind (e.g. "haul truck")
    pub kind: Option<String>,
    pub active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Equipment {
    const COLLECTION: Collection = Collection::Equipment;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Create equipment request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEquipment {
    #[validate(length(min = 1, max = 32, message = "Equipment code must be 1-32 characters"))]
    pub id: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub kind: Option<String>,
    pub notes: Option<String>,
}

/// Update equipment request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateEquipment {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub kind: Option<String>,
    pub active: Option<bool>,
    pub notes: Option<String>,
}
