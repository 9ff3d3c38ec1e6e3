//! Daily assignment (task) model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::AssignmentStatus;
use crate::repository::{Collection, Document};

/// Free-text evidence attached by the operator or an admin while working
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EvidenceNote {
    pub text: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

/// A task given to one operator for one day
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Assignment {
    pub id: String,
    pub operator_id: String,
    pub equipment_id: Option<String>,
    /// Day the work is planned for
    pub date: NaiveDate,
    pub activity: String,
    pub location: String,
    /// Who asked for the work
    pub requester: String,
    pub status: AssignmentStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
    pub resumed_at: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Worked minutes, set when the assignment finishes
    pub duration_minutes: Option<i64>,
    #[serde(default)]
    pub evidence: Vec<EvidenceNote>,
    /// Originating public request, if any
    pub request_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Assignment {
    const COLLECTION: Collection = Collection::Assignments;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Create assignment request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAssignment {
    pub operator_id: String,
    pub equipment_id: Option<String>,
    pub date: NaiveDate,
    #[validate(length(min = 1, message = "Activity is required"))]
    pub activity: String,
    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,
    #[validate(length(min = 1, message = "Requester is required"))]
    pub requester: String,
}

/// Add evidence request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddEvidence {
    #[validate(length(min = 1, max = 2000, message = "Evidence text must be 1-2000 characters"))]
    pub text: String,
}

/// Query parameters for listing assignments
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct AssignmentQuery {
    pub date: Option<NaiveDate>,
    pub operator_id: Option<String>,
    pub status: Option<AssignmentStatus>,
}
