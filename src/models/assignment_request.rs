//! Public assignment request model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::{AssignmentStatus, RequestStatus};
use crate::repository::{Collection, Document};

/// Work request submitted before any assignment exists
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignmentRequest {
    pub id: String,
    pub tracking_code: String,
    pub requester_name: String,
    pub requester_email: Option<String>,
    pub area: Option<String>,
    pub activity: String,
    pub location: String,
    pub requested_date: NaiveDate,
    pub notes: Option<String>,
    pub status: RequestStatus,
    /// Assignments created when the request was approved
    #[serde(default)]
    pub assignment_ids: Vec<String>,
    /// Progress mirrored from the linked assignments
    pub execution_status: Option<AssignmentStatus>,
    pub rejection_reason: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for AssignmentRequest {
    const COLLECTION: Collection = Collection::AssignmentRequests;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Public request submission
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAssignmentRequest {
    #[validate(length(min = 1, message = "Requester name is required"))]
    pub requester_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub requester_email: Option<String>,
    pub area: Option<String>,
    #[validate(length(min = 1, message = "Activity is required"))]
    pub activity: String,
    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,
    pub requested_date: NaiveDate,
    pub notes: Option<String>,
}

/// One operator (and optionally one equipment unit) to assign on approval
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AssignmentSlot {
    pub operator_id: String,
    pub equipment_id: Option<String>,
}

/// Approve request; one assignment is created per slot
#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveAssignmentRequest {
    pub slots: Vec<AssignmentSlot>,
    /// Day of work, defaults to the requested date
    pub date: Option<NaiveDate>,
}

/// Reject request
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RejectAssignmentRequest {
    pub reason: Option<String>,
}

/// Public view of a request, looked up by tracking code
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RequestTracking {
    pub tracking_code: String,
    pub status: RequestStatus,
    pub requested_date: NaiveDate,
    pub execution_status: Option<AssignmentStatus>,
    pub rejection_reason: Option<String>,
}

impl From<&AssignmentRequest> for RequestTracking {
    fn from(request: &AssignmentRequest) -> Self {
        Self {
            tracking_code: request.tracking_code.clone(),
            status: request.status,
            requested_date: request.requested_date,
            execution_status: request.execution_status,
            rejection_reason: request.rejection_reason.clone(),
        }
    }
}

/// Query parameters for listing requests
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct RequestQuery {
    pub status: Option<RequestStatus>,
}
