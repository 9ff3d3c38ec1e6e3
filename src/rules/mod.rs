//! Availability and lifecycle rules
//!
//! Pure functions over the domain models: nothing here touches the store.
//! Services call into these before persisting, so a rejected transition
//! never leaves a half-updated document behind.

pub mod assignment_lifecycle;
pub mod availability;
pub mod loan_lifecycle;
pub mod request_lifecycle;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub use assignment_lifecycle::AssignmentEvent;
pub use availability::{find_conflicts, is_equipment_available, Binding, RangeError, TimeRange};
pub use loan_lifecycle::LoanEvent;
pub use request_lifecycle::aggregate_execution_status;

/// Rejection of a requested state change
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("Cannot {event} a record that is {from}")]
    IllegalTransition { from: String, event: &'static str },

    #[error("Invalid range: {0}")]
    InvalidRange(#[from] RangeError),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Equipment was never delivered, it cannot be returned")]
    NotDelivered,
}

impl LifecycleError {
    pub(crate) fn illegal(from: impl std::fmt::Display, event: &'static str) -> Self {
        LifecycleError::IllegalTransition {
            from: from.to_string(),
            event,
        }
    }
}

/// Whole minutes between two instants, rounded half-up and floored at zero
pub fn elapsed_minutes(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let ms = (to - from).num_milliseconds();
    (ms + 30_000).div_euclid(60_000).max(0)
}
