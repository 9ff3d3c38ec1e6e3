//! Assignment queries on Repository

use chrono::NaiveDate;

use super::{Filter, Repository};
use crate::{
    error::AppResult,
    models::{assignment::AssignmentQuery, Assignment},
};

impl Repository {
    /// Search assignments, ordered by day then creation time
    pub async fn assignments_search(&self, query: &AssignmentQuery) -> AppResult<Vec<Assignment>> {
        let mut filters = Vec::new();
        if let Some(date) = query.date {
            filters.push(Filter::eq("date", date));
        }
        if let Some(ref operator_id) = query.operator_id {
            filters.push(Filter::eq("operator_id", operator_id));
        }
        if let Some(status) = query.status {
            filters.push(Filter::eq("status", status));
        }

        let mut rows: Vec<Assignment> = self.list(&filters).await?;
        rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.created_at.cmp(&b.created_at)));
        Ok(rows)
    }

    /// Assignments planned for one day
    pub async fn assignments_on(&self, date: NaiveDate) -> AppResult<Vec<Assignment>> {
        self.list(&[Filter::eq("date", date)]).await
    }

    /// Assignments created from one request
    pub async fn assignments_for_request(&self, request_id: &str) -> AppResult<Vec<Assignment>> {
        self.list(&[Filter::eq("request_id", request_id)]).await
    }
}
