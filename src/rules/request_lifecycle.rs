//! Assignment request decisions and execution status mirroring

use chrono::{DateTime, Utc};

use super::LifecycleError;
use crate::models::{AssignmentRequest, AssignmentStatus, RequestStatus};

/// Mark a pending request approved and link the created assignments
pub fn approve(
    request: &mut AssignmentRequest,
    assignment_ids: Vec<String>,
    now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    ensure_pending(request, "approve")?;
    if assignment_ids.is_empty() {
        return Err(LifecycleError::MissingField("slots"));
    }
    request.status = RequestStatus::Approved;
    request.assignment_ids = assignment_ids;
    request.execution_status = Some(AssignmentStatus::Pending);
    request.decided_at = Some(now);
    request.updated_at = now;
    Ok(())
}

/// Mark a pending request rejected
pub fn reject(
    request: &mut AssignmentRequest,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    ensure_pending(request, "reject")?;
    request.status = RequestStatus::Rejected;
    request.rejection_reason = reason.filter(|r| !r.trim().is_empty());
    request.decided_at = Some(now);
    request.updated_at = now;
    Ok(())
}

/// Check that `event` may be applied to `request`
pub fn ensure_pending(request: &AssignmentRequest, event: &'static str) -> Result<(), LifecycleError> {
    if request.status == RequestStatus::Pending {
        Ok(())
    } else {
        Err(LifecycleError::illegal(request.status, event))
    }
}

/// Progress of a request derived from its linked assignments
pub fn aggregate_execution_status<I>(statuses: I) -> Option<AssignmentStatus>
where
    I: IntoIterator<Item = AssignmentStatus>,
{
    let statuses: Vec<AssignmentStatus> = statuses.into_iter().collect();
    if statuses.is_empty() {
        return None;
    }
    let any = |s: AssignmentStatus| statuses.iter().any(|x| *x == s);

    let status = if statuses.iter().all(|s| *s == AssignmentStatus::Finished) {
        AssignmentStatus::Finished
    } else if any(AssignmentStatus::InProgress) {
        AssignmentStatus::InProgress
    } else if any(AssignmentStatus::Paused) {
        AssignmentStatus::Paused
    } else if any(AssignmentStatus::Finished) {
        // some done, the rest not started yet
        AssignmentStatus::InProgress
    } else {
        AssignmentStatus::Pending
    };
    Some(status)
}
