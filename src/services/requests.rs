//! Public assignment requests and their approval into assignments

use chrono::Utc;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        assignment::CreateAssignment,
        assignment_request::{
            ApproveAssignmentRequest, CreateAssignmentRequest, RejectAssignmentRequest,
            RequestQuery, RequestTracking,
        },
        notification::{Audience, DispatchNotification},
        Assignment, AssignmentRequest, RequestStatus,
    },
    repository::Repository,
    rules::request_lifecycle,
    services::{assignments::AssignmentsService, notifications::NotificationsService, tracking},
};

#[derive(Clone)]
pub struct RequestsService {
    repository: Repository,
    assignments: AssignmentsService,
    notifications: NotificationsService,
}

impl RequestsService {
    pub fn new(
        repository: Repository,
        assignments: AssignmentsService,
        notifications: NotificationsService,
    ) -> Self {
        Self { repository, assignments, notifications }
    }

    /// Public submission of a work request
    pub async fn submit(&self, data: &CreateAssignmentRequest) -> AppResult<AssignmentRequest> {
        data.validate()?;

        let now = Utc::now();
        let request = AssignmentRequest {
            id: uuid::Uuid::new_v4().to_string(),
            tracking_code: self.unused_tracking_code().await?,
            requester_name: data.requester_name.trim().to_string(),
            requester_email: data.requester_email.clone(),
            area: data.area.clone(),
            activity: data.activity.trim().to_string(),
            location: data.location.trim().to_string(),
            requested_date: data.requested_date,
            notes: data.notes.clone(),
            status: RequestStatus::Pending,
            assignment_ids: Vec::new(),
            execution_status: None,
            rejection_reason: None,
            decided_at: None,
            created_at: now,
            updated_at: now,
        };
        self.repository.put(&request).await?;
        tracing::info!(request_id = %request.id, tracking_code = %request.tracking_code, "Request submitted");

        self.notifications.notify_in_background(DispatchNotification {
            audience: Audience::Admins,
            title: "New assignment request".to_string(),
            body: format!("{}: {} at {}", request.requester_name, request.activity, request.location),
            data: Some(serde_json::json!({ "request_id": request.id })),
        });
        Ok(request)
    }

    async fn unused_tracking_code(&self) -> AppResult<String> {
        for _ in 0..tracking::MAX_ATTEMPTS {
            let code = tracking::generate();
            if self.repository.requests_get_by_tracking_code(&code).await?.is_none() {
                return Ok(code);
            }
        }
        Err(AppError::Internal("Could not allocate a tracking code".to_string()))
    }

    /// Public status lookup
    pub async fn track(&self, code: &str) -> AppResult<RequestTracking> {
        let code = tracking::normalize(code);
        let request = self
            .repository
            .requests_get_by_tracking_code(&code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No request with tracking code {}", code)))?;
        Ok(RequestTracking::from(&request))
    }

    pub async fn list(&self, query: &RequestQuery) -> AppResult<Vec<AssignmentRequest>> {
        self.repository.requests_search(query).await
    }

    pub async fn get(&self, id: &str) -> AppResult<AssignmentRequest> {
        self.repository.fetch(id).await
    }

    /// Approve a request by creating one assignment per slot.
    ///
    /// Every slot is validated before the first assignment is written. If a
    /// later write fails, the assignments already created are removed again.
    pub async fn approve(&self, id: &str, data: &ApproveAssignmentRequest) -> AppResult<AssignmentRequest> {
        let mut request: AssignmentRequest = self.repository.fetch(id).await?;
        request_lifecycle::ensure_pending(&request, "approve")?;
        if data.slots.is_empty() {
            return Err(AppError::Validation("At least one operator slot is required".to_string()));
        }

        let date = data.date.unwrap_or(request.requested_date);
        let drafts: Vec<CreateAssignment> = data
            .slots
            .iter()
            .map(|slot| CreateAssignment {
                operator_id: slot.operator_id.clone(),
                equipment_id: slot.equipment_id.clone(),
                date,
                activity: request.activity.clone(),
                location: request.location.clone(),
                requester: request.requester_name.clone(),
            })
            .collect();
        for draft in &drafts {
            self.assignments.validate_new(draft).await?;
        }

        let mut assignment_ids = Vec::with_capacity(drafts.len());
        for draft in &drafts {
            match self.assignments.create(draft, Some(request.id.clone())).await {
                Ok(assignment) => assignment_ids.push(assignment.id),
                Err(e) => {
                    self.discard_assignments(id, &assignment_ids).await;
                    return Err(e);
                }
            }
        }

        let decided = match request_lifecycle::approve(&mut request, assignment_ids.clone(), Utc::now()) {
            Ok(()) => self.repository.put(&request).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = decided {
            self.discard_assignments(id, &assignment_ids).await;
            return Err(e);
        }
        tracing::info!(
            request_id = %id,
            assignments = request.assignment_ids.len(),
            "Request approved"
        );
        Ok(request)
    }

    /// Remove assignments written for an approval that did not complete
    async fn discard_assignments(&self, request_id: &str, assignment_ids: &[String]) {
        for assignment_id in assignment_ids {
            if let Err(e) = self.repository.delete::<Assignment>(assignment_id).await {
                tracing::warn!(
                    request_id = %request_id,
                    assignment_id = %assignment_id,
                    "Failed to remove assignment of an aborted approval: {}",
                    e
                );
            }
        }
    }

    pub async fn reject(&self, id: &str, data: RejectAssignmentRequest) -> AppResult<AssignmentRequest> {
        let mut request: AssignmentRequest = self.repository.fetch(id).await?;
        request_lifecycle::reject(&mut request, data.reason, Utc::now())?;
        self.repository.put(&request).await?;
        tracing::info!(request_id = %id, "Request rejected");
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    use chrono::NaiveDate;
    use serde_json::Value;

    use super::*;
    use crate::{
        config::PushConfig,
        models::{assignment_request::AssignmentSlot, AssignmentStatus, Operator},
        repository::{Collection, MockDocumentStore},
        rules::LifecycleError,
    };

    async fn setup() -> (Repository, RequestsService) {
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
        let notifications =
            NotificationsService::new(repository.clone(), PushConfig::default(), Vec::new()).unwrap();
        let assignments = AssignmentsService::new(repository.clone(), notifications.clone());
        (repository.clone(), RequestsService::new(repository, assignments, notifications))
    }

    fn submission() -> CreateAssignmentRequest {
        CreateAssignmentRequest {
            requester_name: "Site office".to_string(),
            requester_email: Some("office@example.com".to_string()),
            area: None,
            activity: "Grading".to_string(),
            location: "Access road".to_string(),
            requested_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            notes: None,
        }
    }

    fn slot(operator: &str) -> AssignmentSlot {
        AssignmentSlot { operator_id: operator.to_string(), equipment_id: None }
    }

    #[tokio::test]
    async fn test_approve_creates_linked_assignments() {
        let (repository, service) = setup().await;
        let request = service.submit(&submission()).await.unwrap();

        let approved = service
            .approve(&request.id, &ApproveAssignmentRequest { slots: vec![slot("OP-1")], date: None })
            .await
            .unwrap();
        assert_eq!(approved.status, RequestStatus::Approved);
        assert_eq!(approved.execution_status, Some(AssignmentStatus::Pending));
        assert_eq!(approved.assignment_ids.len(), 1);

        let assignment: Assignment = repository.fetch(&approved.assignment_ids[0]).await.unwrap();
        assert_eq!(assignment.request_id.as_deref(), Some(request.id.as_str()));
        assert_eq!(assignment.date, request.requested_date);
    }

    #[tokio::test]
    async fn test_invalid_slot_creates_nothing() {
        let (repository, service) = setup().await;
        let request = service.submit(&submission()).await.unwrap();

        let result = service
            .approve(
                &request.id,
                &ApproveAssignmentRequest { slots: vec![slot("OP-1"), slot("OP-404")], date: None },
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let linked = repository.assignments_for_request(&request.id).await.unwrap();
        assert!(linked.is_empty());
        assert_eq!(service.get(&request.id).await.unwrap().status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn test_failed_request_write_removes_created_assignments() {
        let now = Utc::now();
        let operator = serde_json::to_value(Operator {
            id: "OP-1".to_string(),
            name: "Rosa".to_string(),
            email: None,
            active: true,
            created_at: now,
            updated_at: now,
        })
        .unwrap();
        let pending = serde_json::to_value(AssignmentRequest {
            id: "REQ-1".to_string(),
            tracking_code: "ABCD2345".to_string(),
            requester_name: "Site office".to_string(),
            requester_email: None,
            area: None,
            activity: "Grading".to_string(),
            location: "Access road".to_string(),
            requested_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            notes: None,
            status: RequestStatus::Pending,
            assignment_ids: Vec::new(),
            execution_status: None,
            rejection_reason: None,
            decided_at: None,
            created_at: now,
            updated_at: now,
        })
        .unwrap();

        let written: Arc<Mutex<HashMap<String, Value>>> = Arc::default();
        let mut store = MockDocumentStore::new();
        let stored = written.clone();
        store.expect_get().returning(move |collection, id| match collection {
            Collection::Operators => Ok(Some(operator.clone())),
            Collection::AssignmentRequests => Ok(Some(pending.clone())),
            Collection::Assignments => Ok(stored.lock().unwrap().get(id).cloned()),
            _ => Ok(None),
        });
        let stored = written.clone();
        store.expect_put().returning(move |collection, id, body| match collection {
            Collection::AssignmentRequests => Err(AppError::Store("connection reset".to_string())),
            _ => {
                stored.lock().unwrap().insert(id.to_string(), body);
                Ok(())
            }
        });
        let stored = written.clone();
        store
            .expect_delete()
            .returning(move |_, id| Ok(stored.lock().unwrap().remove(id).is_some()));
        store.expect_list().returning(|_, _| Ok(Vec::new()));

        let repository = Repository::new(Arc::new(store));
        let notifications =
            NotificationsService::new(repository.clone(), PushConfig::default(), Vec::new()).unwrap();
        let assignments = AssignmentsService::new(repository.clone(), notifications.clone());
        let service = RequestsService::new(repository, assignments, notifications);

        let result = service
            .approve(
                "REQ-1",
                &ApproveAssignmentRequest { slots: vec![slot("OP-1"), slot("OP-1")], date: None },
            )
            .await;
        assert!(matches!(result, Err(AppError::Store(_))));
        assert!(written.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_decided_request_cannot_be_decided_again() {
        let (_, service) = setup().await;
        let request = service.submit(&submission()).await.unwrap();
        service.reject(&request.id, RejectAssignmentRequest::default()).await.unwrap();

        let result = service
            .approve(&request.id, &ApproveAssignmentRequest { slots: vec![slot("OP-1")], date: None })
            .await;
        assert!(matches!(
            result,
            Err(AppError::Lifecycle(LifecycleError::IllegalTransition { .. }))
        ));
    }

    #[tokio::test]
    async fn test_tracking_shows_rejection_reason() {
        let (_, service) = setup().await;
        let request = service.submit(&submission()).await.unwrap();
        service
            .reject(&request.id, RejectAssignmentRequest { reason: Some("No crew".to_string()) })
            .await
            .unwrap();

        let tracked = service.track(&request.tracking_code).await.unwrap();
        assert_eq!(tracked.status, RequestStatus::Rejected);
        assert_eq!(tracked.rejection_reason.as_deref(), Some("No crew"));
    }
}
