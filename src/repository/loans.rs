//! Equipment loan queries on Repository

use super::{Filter, Repository};
use crate::{
    error::AppResult,
    models::{loan::LoanQuery, EquipmentLoan},
};

impl Repository {
    /// Get loan by public tracking code
    pub async fn loans_get_by_tracking_code(&self, code: &str) -> AppResult<Option<EquipmentLoan>> {
        self.find_one(&[Filter::eq("tracking_code", code)]).await
    }

    /// Search loans, newest first
    pub async fn loans_search(&self, query: &LoanQuery) -> AppResult<Vec<EquipmentLoan>> {
        let mut filters = Vec::new();
        if let Some(status) = query.status {
            filters.push(Filter::eq("status", status));
        }
        if let Some(ref equipment_id) = query.equipment_id {
            filters.push(Filter::eq("equipment_id", equipment_id));
        }

        let mut rows: Vec<EquipmentLoan> = self.list(&filters).await?;
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    /// Loans that currently reserve or hold an equipment unit
    pub async fn loans_holding_equipment(&self, equipment_id: &str) -> AppResult<Vec<EquipmentLoan>> {
        let rows: Vec<EquipmentLoan> = self
            .list(&[Filter::eq("equipment_id", equipment_id)])
            .await?;
        Ok(rows
            .into_iter()
            .filter(|loan| loan.status.holds_equipment())
            .collect())
    }
}
