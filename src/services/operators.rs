//! Operator service

use chrono::Utc;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        operator::{CreateOperator, UpdateOperator},
        Operator,
    },
    repository::{Filter, Repository},
};

#[derive(Clone)]
pub struct OperatorsService {
    repository: Repository,
}

impl OperatorsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List operators by name
    pub async fn list(&self, active_only: bool) -> AppResult<Vec<Operator>> {
        let filters = if active_only {
            vec![Filter::eq("active", true)]
        } else {
            Vec::new()
        };
        let mut operators: Vec<Operator> = self.repository.list(&filters).await?;
        operators.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(operators)
    }

    pub async fn get(&self, id: &str) -> AppResult<Operator> {
        self.repository.fetch(id).await
    }

    pub async fn create(&self, data: &CreateOperator) -> AppResult<Operator> {
        data.validate()?;
        let now = Utc::now();
        let operator = Operator {
            id: data.id.trim().to_string(),
            name: data.name.trim().to_string(),
            email: data.email.clone(),
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.repository.insert(&operator).await?;
        tracing::info!(operator_id = %operator.id, "Operator created");
        Ok(operator)
    }

    pub async fn update(&self, id: &str, data: &UpdateOperator) -> AppResult<Operator> {
        data.validate()?;
        let mut operator: Operator = self.repository.fetch(id).await?;
        if let Some(ref name) = data.name {
            operator.name = name.trim().to_string();
        }
        if data.email.is_some() {
            operator.email = data.email.clone();
        }
        if let Some(active) = data.active {
            operator.active = active;
        }
        operator.updated_at = Utc::now();
        self.repository.put(&operator).await?;
        Ok(operator)
    }

    /// Soft delete: the operator stays referenced by past work
    pub async fn deactivate(&self, id: &str) -> AppResult<Operator> {
        let mut operator: Operator = self.repository.fetch(id).await?;
        operator.active = false;
        operator.updated_at = Utc::now();
        self.repository.put(&operator).await?;
        tracing::info!(operator_id = %id, "Operator deactivated");
        Ok(operator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn create(id: &str, name: &str) -> CreateOperator {
        CreateOperator { id: id.to_string(), name: name.to_string(), email: None }
    }

    #[tokio::test]
    async fn test_create_and_list_by_name() {
        let service = OperatorsService::new(Repository::in_memory());
        service.create(&create("OP-2", "Zoila")).await.unwrap();
        service.create(&create("OP-1", "Andrés")).await.unwrap();

        let names: Vec<String> = service.list(false).await.unwrap().into_iter().map(|o| o.name).collect();
        assert_eq!(names, vec!["Andrés", "Zoila"]);
    }

    #[tokio::test]
    async fn test_duplicate_code_conflicts() {
        let service = OperatorsService::new(Repository::in_memory());
        service.create(&create("OP-1", "Rosa")).await.unwrap();
        let result = service.create(&create("OP-1", "Other")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_deactivated_operator_hidden_from_active_list() {
        let service = OperatorsService::new(Repository::in_memory());
        service.create(&create("OP-1", "Rosa")).await.unwrap();
        service.deactivate("OP-1").await.unwrap();
        assert!(service.list(true).await.unwrap().is_empty());
        assert_eq!(service.list(false).await.unwrap().len(), 1);
    }
}
