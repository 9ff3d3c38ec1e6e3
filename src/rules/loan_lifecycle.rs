//! Equipment loan lifecycle: pending -> approved -> in_loan -> returned,
//! or pending -> rejected

use chrono::{DateTime, Utc};

use super::{availability::TimeRange, elapsed_minutes, LifecycleError};
use crate::models::{Attestation, EquipmentLoan, LoanStatus};

/// Admin action on a loan
#[derive(Debug, Clone, PartialEq)]
pub enum LoanEvent {
    Approve {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
    Deliver(Attestation),
    Return(Option<Attestation>),
    Reject(Option<String>),
}

impl LoanEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanEvent::Approve { .. } => "approve",
            LoanEvent::Deliver(_) => "deliver",
            LoanEvent::Return(_) => "return",
            LoanEvent::Reject(_) => "reject",
        }
    }
}

/// Target status of `event` from `from`, if the transition is legal
pub fn next_status(from: LoanStatus, event: &LoanEvent) -> Result<LoanStatus, LifecycleError> {
    match (from, event) {
        (LoanStatus::Pending, LoanEvent::Approve { .. }) => Ok(LoanStatus::Approved),
        (LoanStatus::Pending, LoanEvent::Reject(_)) => Ok(LoanStatus::Rejected),
        (LoanStatus::Approved, LoanEvent::Deliver(_)) => Ok(LoanStatus::InLoan),
        (LoanStatus::InLoan, LoanEvent::Return(_)) => Ok(LoanStatus::Returned),
        _ => Err(LifecycleError::illegal(from, event.as_str())),
    }
}

fn check_attestation(attestation: &Attestation) -> Result<(), LifecycleError> {
    if attestation.name.trim().is_empty() {
        return Err(LifecycleError::MissingField("name"));
    }
    if attestation.id.trim().is_empty() {
        return Err(LifecycleError::MissingField("id"));
    }
    Ok(())
}

/// Apply `event` at `now`.
///
/// Every precondition is checked before the loan is modified.
pub fn apply(
    loan: &mut EquipmentLoan,
    event: LoanEvent,
    now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    let next = next_status(loan.status, &event)?;

    match event {
        LoanEvent::Approve { from, to } => {
            let range = TimeRange::new(from, to)?;
            loan.approved_from = Some(range.from());
            loan.approved_to = Some(range.to());
        }
        LoanEvent::Deliver(attestation) => {
            check_attestation(&attestation)?;
            loan.delivery = Some(attestation);
            loan.delivered_at = Some(now);
        }
        LoanEvent::Return(receipt) => {
            let delivered_at = loan.delivered_at.ok_or(LifecycleError::NotDelivered)?;
            if let Some(receipt) = &receipt {
                check_attestation(receipt)?;
            }
            loan.return_receipt = receipt;
            loan.returned_at = Some(now);
            loan.effective_minutes = Some(elapsed_minutes(delivered_at, now));
        }
        LoanEvent::Reject(reason) => {
            loan.rejection_reason = reason.filter(|r| !r.trim().is_empty());
        }
    }

    loan.status = next;
    loan.updated_at = now;
    Ok(())
}
