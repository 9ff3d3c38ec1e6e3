//! Assignment lifecycle: pending -> in_progress <-> paused -> finished

use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use super::{elapsed_minutes, LifecycleError};
use crate::models::{Assignment, AssignmentStatus};

/// Action an operator (or admin) takes on an assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentEvent {
    Start,
    Pause,
    Resume,
    Finish,
}

impl AssignmentEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentEvent::Start => "start",
            AssignmentEvent::Pause => "pause",
            AssignmentEvent::Resume => "resume",
            AssignmentEvent::Finish => "finish",
        }
    }
}

impl std::fmt::Display for AssignmentEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Target status of `event` from `from`, if the transition is legal
pub fn next_status(
    from: AssignmentStatus,
    event: AssignmentEvent,
) -> Result<AssignmentStatus, LifecycleError> {
    use AssignmentEvent::*;
    use AssignmentStatus::*;

    match (from, event) {
        (Pending, Start) => Ok(InProgress),
        (InProgress, Pause) => Ok(Paused),
        (Paused, Resume) => Ok(InProgress),
        (InProgress, Finish) | (Paused, Finish) => Ok(Finished),
        _ => Err(LifecycleError::illegal(from, event.as_str())),
    }
}

/// Events that are legal from `status`
pub fn allowed_events(status: AssignmentStatus) -> Vec<AssignmentEvent> {
    [
        AssignmentEvent::Start,
        AssignmentEvent::Pause,
        AssignmentEvent::Resume,
        AssignmentEvent::Finish,
    ]
    .into_iter()
    .filter(|event| next_status(status, *event).is_ok())
    .collect()
}

/// Apply `event` at `now`, updating status and timestamps.
///
/// The assignment is left untouched when the transition is illegal.
pub fn apply(
    assignment: &mut Assignment,
    event: AssignmentEvent,
    now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    let to = next_status(assignment.status, event)?;

    match event {
        AssignmentEvent::Start => assignment.start_time = Some(now),
        AssignmentEvent::Pause => assignment.paused_at = Some(now),
        AssignmentEvent::Resume => assignment.resumed_at = Some(now),
        AssignmentEvent::Finish => {
            assignment.end_time = Some(now);
            assignment.duration_minutes = assignment
                .start_time
                .map(|start| elapsed_minutes(start, now));
            if assignment.duration_minutes.is_none() {
                tracing::warn!(
                    assignment_id = %assignment.id,
                    "Assignment finished without a recorded start time, duration left empty"
                );
            }
        }
    }

    assignment.status = to;
    assignment.updated_at = now;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn pending_assignment(created: DateTime<Utc>) -> Assignment {
        Assignment {
            id: "a1".to_string(),
            operator_id: "OP-1".to_string(),
            equipment_id: Some("E1".to_string()),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            activity: "Haul ore".to_string(),
            location: "Pit 3".to_string(),
            requester: "Shift lead".to_string(),
            status: AssignmentStatus::Pending,
            start_time: None,
            paused_at: None,
            resumed_at: None,
            end_time: None,
            duration_minutes: None,
            evidence: Vec::new(),
            request_id: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_only_start_from_pending() {
        assert_eq!(allowed_events(AssignmentStatus::Pending), vec![AssignmentEvent::Start]);
    }

    #[test]
    fn test_nothing_from_finished() {
        assert!(allowed_events(AssignmentStatus::Finished).is_empty());
    }

    #[test]
    fn test_transition_table() {
        use AssignmentStatus::*;
        assert_eq!(next_status(InProgress, AssignmentEvent::Pause), Ok(Paused));
        assert_eq!(next_status(Paused, AssignmentEvent::Resume), Ok(InProgress));
        assert_eq!(next_status(Paused, AssignmentEvent::Finish), Ok(Finished));
        assert!(next_status(Pending, AssignmentEvent::Finish).is_err());
        assert!(next_status(InProgress, AssignmentEvent::Start).is_err());
        assert!(next_status(Paused, AssignmentEvent::Pause).is_err());
    }

    #[test]
    fn test_finish_after_ninety_minutes() {
        let mut a = pending_assignment(t0());
        apply(&mut a, AssignmentEvent::Start, t0()).unwrap();
        apply(&mut a, AssignmentEvent::Finish, t0() + Duration::minutes(90)).unwrap();
        assert_eq!(a.status, AssignmentStatus::Finished);
        assert_eq!(a.duration_minutes, Some(90));
        assert_eq!(a.end_time, Some(t0() + Duration::minutes(90)));
    }

    #[test]
    fn test_pause_resume_keeps_original_start() {
        let mut a = pending_assignment(t0());
        apply(&mut a, AssignmentEvent::Start, t0()).unwrap();
        apply(&mut a, AssignmentEvent::Pause, t0() + Duration::minutes(20)).unwrap();
        apply(&mut a, AssignmentEvent::Resume, t0() + Duration::minutes(50)).unwrap();
        apply(&mut a, AssignmentEvent::Finish, t0() + Duration::minutes(75)).unwrap();

        assert_eq!(a.status, AssignmentStatus::Finished);
        assert_eq!(a.start_time, Some(t0()));
        assert_eq!(a.paused_at, Some(t0() + Duration::minutes(20)));
        assert_eq!(a.resumed_at, Some(t0() + Duration::minutes(50)));
        assert_eq!(a.duration_minutes, Some(75));
    }

    #[test]
    fn test_illegal_transition_leaves_record_untouched() {
        let mut a = pending_assignment(t0());
        let err = apply(&mut a, AssignmentEvent::Finish, t0() + Duration::hours(1)).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::IllegalTransition { from: "pending".to_string(), event: "finish" }
        );
        assert_eq!(a.status, AssignmentStatus::Pending);
        assert!(a.end_time.is_none());
        assert_eq!(a.updated_at, t0());
    }

    #[test]
    fn test_finish_without_start_time_has_no_duration() {
        let mut a = pending_assignment(t0());
        a.status = AssignmentStatus::InProgress;
        apply(&mut a, AssignmentEvent::Finish, t0() + Duration::hours(1)).unwrap();
        assert_eq!(a.status, AssignmentStatus::Finished);
        assert_eq!(a.duration_minutes, None);
    }

    #[test]
    fn test_clock_skew_floors_duration() {
        let mut a = pending_assignment(t0());
        apply(&mut a, AssignmentEvent::Start, t0()).unwrap();
        apply(&mut a, AssignmentEvent::Finish, t0() - Duration::minutes(3)).unwrap();
        assert_eq!(a.duration_minutes, Some(0));
    }
}
