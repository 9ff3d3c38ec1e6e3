//! Assignment request queries on Repository

use super::{Filter, Repository};
use crate::{
    error::AppResult,
    models::{assignment_request::RequestQuery, AssignmentRequest},
};

impl Repository {
    /// Get request by public tracking code
    pub async fn requests_get_by_tracking_code(
        &self,
        code: &str,
    ) -> AppResult<Option<AssignmentRequest>> {
        self.find_one(&[Filter::eq("tracking_code", code)]).await
    }

    /// Search requests, newest first
    pub async fn requests_search(&self, query: &RequestQuery) -> AppResult<Vec<AssignmentRequest>> {
        let mut filters = Vec::new();
        if let Some(status) = query.status {
            filters.push(Filter::eq("status", status));
        }

        let mut rows: Vec<AssignmentRequest> = self.list(&filters).await?;
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}
