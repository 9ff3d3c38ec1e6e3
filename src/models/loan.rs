//! Equipment loan model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::LoanStatus;
use crate::{
    repository::{Collection, Document},
    rules::availability::{Binding, TimeRange},
};

/// Signed hand-over record (delivery or return)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Attestation {
    /// Name of the person receiving the equipment
    #[validate(length(min = 1, message = "Receiver name is required"))]
    pub name: String,
    /// Identity document / employee number of that person
    #[validate(length(min = 1, message = "Receiver id is required"))]
    pub id: String,
    /// Condition of the equipment at hand-over
    pub condition: Option<String>,
}

/// Equipment loan requested by someone outside the operator roster
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EquipmentLoan {
    pub id: String,
    /// Public code the applicant uses to follow the loan
    pub tracking_code: String,
    pub applicant_name: String,
    pub applicant_id: String,
    pub applicant_email: Option<String>,
    pub applicant_area: Option<String>,
    pub equipment_id: Option<String>,
    pub purpose: Option<String>,
    pub requested_from: DateTime<Utc>,
    pub requested_to: DateTime<Utc>,
    pub approved_from: Option<DateTime<Utc>>,
    pub approved_to: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub delivery: Option<Attestation>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub return_receipt: Option<Attestation>,
    pub returned_at: Option<DateTime<Utc>>,
    /// Minutes between delivery and return
    pub effective_minutes: Option<i64>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for EquipmentLoan {
    const COLLECTION: Collection = Collection::EquipmentLoans;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Binding<DateTime<Utc>> for EquipmentLoan {
    fn binding_id(&self) -> &str {
        &self.id
    }

    fn equipment_id(&self) -> Option<&str> {
        self.equipment_id.as_deref()
    }

    fn is_active(&self) -> bool {
        self.status.holds_equipment()
    }

    fn range(&self) -> Option<TimeRange<DateTime<Utc>>> {
        match (self.approved_from, self.approved_to) {
            (Some(from), Some(to)) => TimeRange::new(from, to).ok(),
            _ => None,
        }
    }
}

/// Public loan application
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLoan {
    #[validate(length(min = 1, message = "Applicant name is required"))]
    pub applicant_name: String,
    #[validate(length(min = 1, message = "Applicant id is required"))]
    pub applicant_id: String,
    #[validate(email(message = "Invalid email format"))]
    pub applicant_email: Option<String>,
    pub applicant_area: Option<String>,
    pub equipment_id: Option<String>,
    pub purpose: Option<String>,
    pub requested_from: DateTime<Utc>,
    pub requested_to: DateTime<Utc>,
}

/// Admin approval with the granted range
#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveLoan {
    pub approved_from: DateTime<Utc>,
    pub approved_to: DateTime<Utc>,
}

/// Return request; the attestation is optional
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ReturnLoan {
    pub receipt: Option<Attestation>,
}

/// Rejection request
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RejectLoan {
    pub reason: Option<String>,
}

/// Public view of a loan, looked up by tracking code
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoanTracking {
    pub tracking_code: String,
    pub status: LoanStatus,
    pub requested_from: DateTime<Utc>,
    pub requested_to: DateTime<Utc>,
    pub approved_from: Option<DateTime<Utc>>,
    pub approved_to: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

impl From<&EquipmentLoan> for LoanTracking {
    fn from(loan: &EquipmentLoan) -> Self {
        Self {
            tracking_code: loan.tracking_code.clone(),
            status: loan.status,
            requested_from: loan.requested_from,
            requested_to: loan.requested_to,
            approved_from: loan.approved_from,
            approved_to: loan.approved_to,
            rejection_reason: loan.rejection_reason.clone(),
        }
    }
}

/// Query parameters for listing loans
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct LoanQuery {
    pub status: Option<LoanStatus>,
    pub equipment_id: Option<String>,
}
