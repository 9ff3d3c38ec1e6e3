//! Weekly assignment queries on Repository

use super::{Filter, Repository};
use crate::{
    error::AppResult,
    models::{
        weekly_assignment::WeeklyAssignmentQuery, BindingStatus, WeeklyAssignment,
    },
};

impl Repository {
    /// Active bindings of one equipment unit
    pub async fn weekly_assignments_active_for_equipment(
        &self,
        equipment_id: &str,
    ) -> AppResult<Vec<WeeklyAssignment>> {
        self.list(&[
            Filter::eq("equipment_id", equipment_id),
            Filter::eq("status", BindingStatus::Active),
        ])
        .await
    }

    /// Search bindings; the date window keeps bindings that intersect it
    pub async fn weekly_assignments_search(
        &self,
        query: &WeeklyAssignmentQuery,
    ) -> AppResult<Vec<WeeklyAssignment>> {
        let mut filters = Vec::new();
        if let Some(ref equipment_id) = query.equipment_id {
            filters.push(Filter::eq("equipment_id", equipment_id));
        }
        if let Some(ref operator_id) = query.operator_id {
            filters.push(Filter::eq("operator_id", operator_id));
        }
        if let Some(status) = query.status {
            filters.push(Filter::eq("status", status));
        }
        if let Some(from) = query.from {
            filters.push(Filter::gte("end_date", from));
        }
        if let Some(to) = query.to {
            filters.push(Filter::lte("start_date", to));
        }

        let mut rows: Vec<WeeklyAssignment> = self.list(&filters).await?;
        rows.sort_by(|a, b| a.start_date.cmp(&b.start_date).then_with(|| a.id.cmp(&b.id)));
        Ok(rows)
    }
}
