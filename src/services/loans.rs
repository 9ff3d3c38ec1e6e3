//! Equipment loan service

use chrono::{DateTime, Utc};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{ApproveLoan, CreateLoan, LoanQuery, LoanTracking, RejectLoan, ReturnLoan},
        notification::{Audience, DispatchNotification},
        Attestation, Equipment, EquipmentLoan, LoanStatus,
    },
    repository::Repository,
    rules::{find_conflicts, loan_lifecycle, LifecycleError, LoanEvent, TimeRange},
    services::{notifications::NotificationsService, tracking},
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    notifications: NotificationsService,
}

impl LoansService {
    pub fn new(repository: Repository, notifications: NotificationsService) -> Self {
        Self { repository, notifications }
    }

    /// Public submission of a loan application
    pub async fn submit(&self, data: &CreateLoan) -> AppResult<EquipmentLoan> {
        data.validate()?;
        TimeRange::new(data.requested_from, data.requested_to).map_err(LifecycleError::from)?;
        if let Some(ref equipment_id) = data.equipment_id {
            self.repository.fetch::<Equipment>(equipment_id).await?;
        }

        let now = Utc::now();
        let loan = EquipmentLoan {
            id: uuid::Uuid::new_v4().to_string(),
            tracking_code: self.unused_tracking_code().await?,
            applicant_name: data.applicant_name.trim().to_string(),
            applicant_id: data.applicant_id.trim().to_string(),
            applicant_email: data.applicant_email.clone(),
            applicant_area: data.applicant_area.clone(),
            equipment_id: data.equipment_id.clone(),
            purpose: data.purpose.clone(),
            requested_from: data.requested_from,
            requested_to: data.requested_to,
            approved_from: None,
            approved_to: None,
            status: LoanStatus::Pending,
            delivery: None,
            delivered_at: None,
            return_receipt: None,
            returned_at: None,
            effective_minutes: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };
        self.repository.put(&loan).await?;
        tracing::info!(loan_id = %loan.id, tracking_code = %loan.tracking_code, "Loan submitted");

        self.notifications.notify_in_background(DispatchNotification {
            audience: Audience::Admins,
            title: "New equipment loan request".to_string(),
            body: format!("{} requested equipment ({})", loan.applicant_name, loan.tracking_code),
            data: Some(serde_json::json!({ "loan_id": loan.id })),
        });
        Ok(loan)
    }

    async fn unused_tracking_code(&self) -> AppResult<String> {
        for _ in 0..tracking::MAX_ATTEMPTS {
            let code = tracking::generate();
            if self.repository.loans_get_by_tracking_code(&code).await?.is_none() {
                return Ok(code);
            }
        }
        Err(AppError::Internal("Could not allocate a tracking code".to_string()))
    }

    /// Public status lookup
    pub async fn track(&self, code: &str) -> AppResult<LoanTracking> {
        let code = tracking::normalize(code);
        let loan = self
            .repository
            .loans_get_by_tracking_code(&code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No loan with tracking code {}", code)))?;
        Ok(LoanTracking::from(&loan))
    }

    pub async fn list(&self, query: &LoanQuery) -> AppResult<Vec<EquipmentLoan>> {
        self.repository.loans_search(query).await
    }

    pub async fn get(&self, id: &str) -> AppResult<EquipmentLoan> {
        self.repository.fetch(id).await
    }

    /// Approve for a time window; the equipment must be free in it
    pub async fn approve(&self, id: &str, data: &ApproveLoan) -> AppResult<EquipmentLoan> {
        let mut loan: EquipmentLoan = self.repository.fetch(id).await?;
        loan_lifecycle::apply(
            &mut loan,
            LoanEvent::Approve { from: data.approved_from, to: data.approved_to },
            Utc::now(),
        )?;
        self.ensure_equipment_free(&loan, data.approved_from, data.approved_to).await?;
        self.save(&loan, "approve").await?;
        Ok(loan)
    }

    /// Hand the equipment over
    pub async fn deliver(&self, id: &str, attestation: Attestation) -> AppResult<EquipmentLoan> {
        let mut loan: EquipmentLoan = self.repository.fetch(id).await?;
        loan_lifecycle::apply(&mut loan, LoanEvent::Deliver(attestation), Utc::now())?;
        self.save(&loan, "deliver").await?;
        Ok(loan)
    }

    /// Take the equipment back
    pub async fn return_loan(&self, id: &str, data: ReturnLoan) -> AppResult<EquipmentLoan> {
        let mut loan: EquipmentLoan = self.repository.fetch(id).await?;
        loan_lifecycle::apply(&mut loan, LoanEvent::Return(data.receipt), Utc::now())?;
        self.save(&loan, "return").await?;
        Ok(loan)
    }

    pub async fn reject(&self, id: &str, data: RejectLoan) -> AppResult<EquipmentLoan> {
        let mut loan: EquipmentLoan = self.repository.fetch(id).await?;
        loan_lifecycle::apply(&mut loan, LoanEvent::Reject(data.reason), Utc::now())?;
        self.save(&loan, "reject").await?;
        Ok(loan)
    }

    async fn ensure_equipment_free(
        &self,
        loan: &EquipmentLoan,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<()> {
        let Some(ref equipment_id) = loan.equipment_id else {
            return Ok(());
        };
        let range = TimeRange::new(from, to).map_err(LifecycleError::from)?;
        let held = self.repository.loans_holding_equipment(equipment_id).await?;
        let others = held.iter().filter(|other| other.id != loan.id);

        if let Some(conflict) = find_conflicts(equipment_id, &range, others).first() {
            return Err(AppError::Unavailable(format!(
                "Equipment {} is already lent under {} in that window",
                equipment_id, conflict.tracking_code
            )));
        }
        Ok(())
    }

    async fn save(&self, loan: &EquipmentLoan, event: &str) -> AppResult<()> {
        self.repository.put(loan).await?;
        tracing::info!(
            loan_id = %loan.id,
            event,
            status = %loan.status,
            effective_minutes = ?loan.effective_minutes,
            "Loan updated"
        );
        Ok(())
    }
}
