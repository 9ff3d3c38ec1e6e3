//! Daily assignments and their execution lifecycle

use chrono::Utc;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        assignment::{AddEvidence, AssignmentQuery, CreateAssignment},
        notification::{Audience, DispatchNotification},
        Assignment, AssignmentRequest, AssignmentStatus, Equipment, EvidenceNote, Operator,
        Principal,
    },
    repository::Repository,
    rules::{aggregate_execution_status, assignment_lifecycle, AssignmentEvent},
    services::notifications::NotificationsService,
};

#[derive(Clone)]
pub struct AssignmentsService {
    repository: Repository,
    notifications: NotificationsService,
}

impl AssignmentsService {
    pub fn new(repository: Repository, notifications: NotificationsService) -> Self {
        Self { repository, notifications }
    }

    /// Search assignments; operators only see their own
    pub async fn list(&self, mut query: AssignmentQuery, principal: &Principal) -> AppResult<Vec<Assignment>> {
        if let Some(operator_id) = principal.operator_id() {
            query.operator_id = Some(operator_id.to_string());
        }
        self.repository.assignments_search(&query).await
    }

    pub async fn get(&self, id: &str, principal: &Principal) -> AppResult<Assignment> {
        let assignment: Assignment = self.repository.fetch(id).await?;
        principal.require_admin_or_operator(&assignment.operator_id)?;
        Ok(assignment)
    }

    /// Check an assignment could be created without writing anything
    pub async fn validate_new(&self, data: &CreateAssignment) -> AppResult<()> {
        data.validate()?;
        let operator: Operator = self.repository.fetch(&data.operator_id).await?;
        if !operator.active {
            return Err(AppError::BusinessRule(format!("Operator {} is inactive", operator.id)));
        }
        if let Some(ref equipment_id) = data.equipment_id {
            let equipment: Equipment = self.repository.fetch(equipment_id).await?;
            if !equipment.active {
                return Err(AppError::BusinessRule(format!("Equipment {} is inactive", equipment.id)));
            }
        }
        Ok(())
    }

    /// Create a pending assignment, optionally linked to the request it fulfils
    pub async fn create(&self, data: &CreateAssignment, request_id: Option<String>) -> AppResult<Assignment> {
        self.validate_new(data).await?;

        let now = Utc::now();
        let assignment = Assignment {
            id: uuid::Uuid::new_v4().to_string(),
            operator_id: data.operator_id.clone(),
            equipment_id: data.equipment_id.clone(),
            date: data.date,
            activity: data.activity.trim().to_string(),
            location: data.location.trim().to_string(),
            requester: data.requester.trim().to_string(),
            status: AssignmentStatus::Pending,
            start_time: None,
            paused_at: None,
            resumed_at: None,
            end_time: None,
            duration_minutes: None,
            evidence: Vec::new(),
            request_id,
            created_at: now,
            updated_at: now,
        };
        self.repository.put(&assignment).await?;

        tracing::info!(
            assignment_id = %assignment.id,
            operator_id = %assignment.operator_id,
            date = %assignment.date,
            "Assignment created"
        );

        self.notifications.notify_in_background(DispatchNotification {
            audience: Audience::Operator { operator_id: assignment.operator_id.clone() },
            title: "New assignment".to_string(),
            body: format!("{} at {} on {}", assignment.activity, assignment.location, assignment.date),
            data: Some(serde_json::json!({ "assignment_id": assignment.id })),
        });

        Ok(assignment)
    }

    /// Apply a lifecycle event on behalf of the assigned operator or an admin
    pub async fn transition(
        &self,
        id: &str,
        event: AssignmentEvent,
        principal: &Principal,
    ) -> AppResult<Assignment> {
        let mut assignment: Assignment = self.repository.fetch(id).await?;
        principal.require_admin_or_operator(&assignment.operator_id)?;

        let from = assignment.status;
        assignment_lifecycle::apply(&mut assignment, event, Utc::now())?;
        self.repository.put(&assignment).await?;

        tracing::info!(
            assignment_id = %id,
            event = %event,
            from = %from,
            to = %assignment.status,
            duration_minutes = ?assignment.duration_minutes,
            "Assignment transitioned"
        );

        self.sync_request(&assignment).await;
        Ok(assignment)
    }

    /// Append a field note to an assignment
    pub async fn add_evidence(&self, id: &str, data: &AddEvidence, principal: &Principal) -> AppResult<Assignment> {
        data.validate()?;
        let mut assignment: Assignment = self.repository.fetch(id).await?;
        principal.require_admin_or_operator(&assignment.operator_id)?;

        let now = Utc::now();
        assignment.evidence.push(EvidenceNote {
            text: data.text.trim().to_string(),
            author: principal.uid.clone(),
            created_at: now,
        });
        assignment.updated_at = now;
        self.repository.put(&assignment).await?;
        Ok(assignment)
    }

    /// Remove an assignment that never started
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let assignment: Assignment = self.repository.fetch(id).await?;
        if assignment.status != AssignmentStatus::Pending {
            return Err(AppError::BusinessRule(format!(
                "Only pending assignments can be deleted (assignment is {})",
                assignment.status
            )));
        }
        self.repository.delete::<Assignment>(id).await?;
        tracing::info!(assignment_id = %id, "Assignment deleted");
        self.sync_request(&assignment).await;
        Ok(())
    }

    /// Mirror progress into the originating request.
    ///
    /// Best effort: the assignment write already succeeded and stays
    /// committed whatever happens here.
    async fn sync_request(&self, assignment: &Assignment) {
        let Some(ref request_id) = assignment.request_id else {
            return;
        };
        if let Err(e) = self.refresh_request_status(request_id).await {
            tracing::warn!(
                request_id = %request_id,
                assignment_id = %assignment.id,
                "Failed to update request execution status: {}",
                e
            );
        }
    }

    async fn refresh_request_status(&self, request_id: &str) -> AppResult<()> {
        let mut request: AssignmentRequest = self.repository.fetch(request_id).await?;
        let linked = self.repository.assignments_for_request(request_id).await?;

        let linked_before = request.assignment_ids.len();
        request.assignment_ids.retain(|id| linked.iter().any(|a| &a.id == id));
        let status = aggregate_execution_status(linked.iter().map(|a| a.status));
        if request.execution_status == status && request.assignment_ids.len() == linked_before {
            return Ok(());
        }
        request.execution_status = status;
        request.updated_at = Utc::now();
        self.repository.put(&request).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use serde_json::Value;

    use super::*;
    use crate::{
        config::PushConfig,
        models::{RequestStatus, Role},
        repository::{Collection, MockDocumentStore},
        rules::LifecycleError,
    };

    fn admin() -> Principal {
        Principal { uid: "admin".to_string(), email: None, role: Role::Admin }
    }

    fn operator(code: &str) -> Principal {
        Principal {
            uid: format!("uid-{}", code),
            email: None,
            role: Role::Operator { operator_id: code.to_string() },
        }
    }

    fn service(repository: Repository) -> AssignmentsService {
        let notifications =
            NotificationsService::new(repository.clone(), PushConfig::default(), Vec::new()).unwrap();
        AssignmentsService::new(repository, notifications)
    }

    async fn seeded() -> (Repository, AssignmentsService) {
        let repository = Repository::in_memory();
        let now = Utc::now();
        repository
            .put(&Operator {
                id: "OP-1".to_string(),
                name: "Rosa".to_string(),
                email: None,
                active: true,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        (repository.clone(), service(repository))
    }

    fn create() -> CreateAssignment {
        CreateAssignment {
            operator_id: "OP-1".to_string(),
            equipment_id: None,
            date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            activity: "Trench".to_string(),
            location: "North pit".to_string(),
            requester: "Site office".to_string(),
        }
    }

    fn request(id: &str) -> AssignmentRequest {
        let now = Utc::now();
        AssignmentRequest {
            id: id.to_string(),
            tracking_code: "ABCD2345".to_string(),
            requester_name: "Site office".to_string(),
            requester_email: None,
            area: None,
            activity: "Trench".to_string(),
            location: "North pit".to_string(),
            requested_date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            notes: None,
            status: RequestStatus::Approved,
            assignment_ids: Vec::new(),
            execution_status: Some(AssignmentStatus::Pending),
            rejection_reason: None,
            decided_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_pause_resume_finish_keeps_original_start() {
        let (_, service) = seeded().await;
        let assignment = service.create(&create(), None).await.unwrap();
        let op = operator("OP-1");

        let started = service.transition(&assignment.id, AssignmentEvent::Start, &op).await.unwrap();
        let start_time = started.start_time;
        service.transition(&assignment.id, AssignmentEvent::Pause, &op).await.unwrap();
        service.transition(&assignment.id, AssignmentEvent::Resume, &op).await.unwrap();
        let finished = service.transition(&assignment.id, AssignmentEvent::Finish, &op).await.unwrap();

        assert_eq!(finished.status, AssignmentStatus::Finished);
        assert_eq!(finished.start_time, start_time);
        assert_eq!(finished.duration_minutes, Some(0));
    }

    #[tokio::test]
    async fn test_illegal_transition_is_not_persisted() {
        let (repository, service) = seeded().await;
        let assignment = service.create(&create(), None).await.unwrap();

        let result = service.transition(&assignment.id, AssignmentEvent::Finish, &admin()).await;
        assert!(matches!(
            result,
            Err(AppError::Lifecycle(LifecycleError::IllegalTransition { .. }))
        ));
        let stored: Assignment = repository.fetch(&assignment.id).await.unwrap();
        assert_eq!(stored.status, AssignmentStatus::Pending);
    }

    #[tokio::test]
    async fn test_other_operator_cannot_transition() {
        let (_, service) = seeded().await;
        let assignment = service.create(&create(), None).await.unwrap();
        let result = service.transition(&assignment.id, AssignmentEvent::Start, &operator("OP-2")).await;
        assert!(matches!(result, Err(AppError::Authorization(_))));
    }

    #[tokio::test]
    async fn test_only_pending_can_be_deleted() {
        let (_, service) = seeded().await;
        let assignment = service.create(&create(), None).await.unwrap();
        service.transition(&assignment.id, AssignmentEvent::Start, &admin()).await.unwrap();
        assert!(matches!(service.delete(&assignment.id).await, Err(AppError::BusinessRule(_))));
    }

    #[tokio::test]
    async fn test_progress_is_mirrored_into_request() {
        let (repository, service) = seeded().await;
        repository.put(&request("REQ-1")).await.unwrap();
        let assignment = service.create(&create(), Some("REQ-1".to_string())).await.unwrap();

        service.transition(&assignment.id, AssignmentEvent::Start, &admin()).await.unwrap();
        let stored: AssignmentRequest = repository.fetch("REQ-1").await.unwrap();
        assert_eq!(stored.execution_status, Some(AssignmentStatus::InProgress));

        service.transition(&assignment.id, AssignmentEvent::Finish, &admin()).await.unwrap();
        let stored: AssignmentRequest = repository.fetch("REQ-1").await.unwrap();
        assert_eq!(stored.execution_status, Some(AssignmentStatus::Finished));
    }

    #[tokio::test]
    async fn test_request_sync_failure_does_not_fail_transition() {
        let mut assignment_doc = serde_json::to_value(Assignment {
            request_id: Some("REQ-1".to_string()),
            ..sample_assignment()
        })
        .unwrap();
        let request_doc = serde_json::to_value(request("REQ-1")).unwrap();

        let mut store = MockDocumentStore::new();
        let listed = assignment_doc.clone();
        store.expect_get().returning(move |collection, _| match collection {
            Collection::Assignments => Ok(Some(listed.clone())),
            Collection::AssignmentRequests => Ok(Some(request_doc.clone())),
            _ => Ok(None),
        });
        assignment_doc["status"] = Value::String("in_progress".to_string());
        store
            .expect_list()
            .returning(move |_, _| Ok(vec![assignment_doc.clone()]));
        store
            .expect_put()
            .withf(|collection, _, _| *collection == Collection::Assignments)
            .times(1)
            .returning(|_, _, _| Ok(()));
        store
            .expect_put()
            .withf(|collection, _, _| *collection == Collection::AssignmentRequests)
            .times(1)
            .returning(|_, _, _| Err(AppError::Store("connection reset".to_string())));

        let service = service(Repository::new(Arc::new(store)));
        let started = service.transition("A-1", AssignmentEvent::Start, &admin()).await.unwrap();
        assert_eq!(started.status, AssignmentStatus::InProgress);
    }

    fn sample_assignment() -> Assignment {
        let now = Utc::now();
        Assignment {
            id: "A-1".to_string(),
            operator_id: "OP-1".to_string(),
            equipment_id: None,
            date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            activity: "Trench".to_string(),
            location: "North pit".to_string(),
            requester: "Site office".to_string(),
            status: AssignmentStatus::Pending,
            start_time: None,
            paused_at: None,
            resumed_at: None,
            end_time: None,
            duration_minutes: None,
            evidence: Vec::new(),
            request_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}
