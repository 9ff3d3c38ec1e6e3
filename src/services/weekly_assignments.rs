//! Weekly operator/equipment bindings

use chrono::{NaiveDate, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{
        weekly_assignment::{CreateWeeklyAssignment, UpdateWeeklyAssignment, WeeklyAssignmentQuery},
        BindingStatus, Equipment, Operator, Principal, WeeklyAssignment,
    },
    repository::Repository,
    rules::{find_conflicts, is_equipment_available, LifecycleError, TimeRange},
};

#[derive(Clone)]
pub struct WeeklyAssignmentsService {
    repository: Repository,
}

impl WeeklyAssignmentsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search bindings; operators only see their own
    pub async fn list(
        &self,
        mut query: WeeklyAssignmentQuery,
        principal: &Principal,
    ) -> AppResult<Vec<WeeklyAssignment>> {
        if let Some(operator_id) = principal.operator_id() {
            query.operator_id = Some(operator_id.to_string());
        }
        self.repository.weekly_assignments_search(&query).await
    }

    pub async fn get(&self, id: &str, principal: &Principal) -> AppResult<WeeklyAssignment> {
        let binding: WeeklyAssignment = self.repository.fetch(id).await?;
        principal.require_admin_or_operator(&binding.operator_id)?;
        Ok(binding)
    }

    pub async fn create(&self, data: &CreateWeeklyAssignment) -> AppResult<WeeklyAssignment> {
        let range = day_range(data.start_date, data.end_date)?;

        let operator: Operator = self.repository.fetch(&data.operator_id).await?;
        if !operator.active {
            return Err(AppError::BusinessRule(format!("Operator {} is inactive", operator.id)));
        }
        let equipment: Equipment = self.repository.fetch(&data.equipment_id).await?;
        if !equipment.active {
            return Err(AppError::BusinessRule(format!("Equipment {} is inactive", equipment.id)));
        }

        self.ensure_available(&equipment.id, &range, None).await?;

        let now = Utc::now();
        let binding = WeeklyAssignment {
            id: uuid::Uuid::new_v4().to_string(),
            operator_id: operator.id,
            equipment_id: equipment.id,
            start_date: data.start_date,
            end_date: data.end_date,
            shift: data.shift,
            status: BindingStatus::Active,
            notes: data.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        self.repository.put(&binding).await?;

        tracing::info!(
            binding_id = %binding.id,
            operator_id = %binding.operator_id,
            equipment_id = %binding.equipment_id,
            start = %binding.start_date,
            end = %binding.end_date,
            "Weekly assignment created"
        );
        Ok(binding)
    }

    /// Change dates, shift or notes; an active binding is re-checked
    pub async fn update(&self, id: &str, data: &UpdateWeeklyAssignment) -> AppResult<WeeklyAssignment> {
        let mut binding: WeeklyAssignment = self.repository.fetch(id).await?;
        let start = data.start_date.unwrap_or(binding.start_date);
        let end = data.end_date.unwrap_or(binding.end_date);
        let range = day_range(start, end)?;

        if binding.status == BindingStatus::Active {
            self.ensure_available(&binding.equipment_id, &range, Some(&binding.id)).await?;
        }

        binding.start_date = start;
        binding.end_date = end;
        if let Some(shift) = data.shift {
            binding.shift = shift;
        }
        if data.notes.is_some() {
            binding.notes = data.notes.clone();
        }
        binding.updated_at = Utc::now();
        self.repository.put(&binding).await?;
        Ok(binding)
    }

    /// Release the equipment without deleting the binding
    pub async fn deactivate(&self, id: &str) -> AppResult<WeeklyAssignment> {
        let mut binding: WeeklyAssignment = self.repository.fetch(id).await?;
        if binding.status == BindingStatus::Inactive {
            return Ok(binding);
        }
        binding.status = BindingStatus::Inactive;
        binding.updated_at = Utc::now();
        self.repository.put(&binding).await?;
        tracing::info!(binding_id = %id, "Weekly assignment deactivated");
        Ok(binding)
    }

    /// Reactivate a binding if its equipment is still free
    pub async fn activate(&self, id: &str) -> AppResult<WeeklyAssignment> {
        let mut binding: WeeklyAssignment = self.repository.fetch(id).await?;
        if binding.status == BindingStatus::Active {
            return Ok(binding);
        }
        let range = day_range(binding.start_date, binding.end_date)?;
        self.ensure_available(&binding.equipment_id, &range, Some(&binding.id)).await?;

        binding.status = BindingStatus::Active;
        binding.updated_at = Utc::now();
        self.repository.put(&binding).await?;
        tracing::info!(binding_id = %id, "Weekly assignment activated");
        Ok(binding)
    }

    async fn ensure_available(
        &self,
        equipment_id: &str,
        range: &TimeRange<NaiveDate>,
        exclude: Option<&str>,
    ) -> AppResult<()> {
        let existing = self
            .repository
            .weekly_assignments_active_for_equipment(equipment_id)
            .await?;
        let others: Vec<&WeeklyAssignment> = existing
            .iter()
            .filter(|b| Some(b.id.as_str()) != exclude)
            .collect();
        if is_equipment_available(equipment_id, range, others.iter().copied()) {
            return Ok(());
        }

        if let Some(conflict) = find_conflicts(equipment_id, range, others.iter().copied()).first() {
            tracing::debug!(equipment_id, conflict = %conflict.id, "Binding rejected");
            return Err(AppError::Unavailable(format!(
                "Equipment {} is already assigned to operator {} from {} to {} (binding {})",
                equipment_id, conflict.operator_id, conflict.start_date, conflict.end_date, conflict.id
            )));
        }
        Ok(())
    }
}

fn day_range(start: NaiveDate, end: NaiveDate) -> AppResult<TimeRange<NaiveDate>> {
    TimeRange::from_inclusive_days(start, end)
        .map_err(|e| AppError::from(LifecycleError::from(e)))
}
