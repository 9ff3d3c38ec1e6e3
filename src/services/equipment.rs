//! Equipment service

use chrono::Utc;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        equipment::{CreateEquipment, UpdateEquipment},
        Equipment,
    },
    repository::{Filter, Repository},
};

#[derive(Clone)]
pub struct EquipmentService {
    repository: Repository,
}

impl EquipmentService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, active_only: bool) -> AppResult<Vec<Equipment>> {
        let filters = if active_only {
            vec![Filter::eq("active", true)]
        } else {
            Vec::new()
        };
        self.repository.list(&filters).await
    }

    pub async fn get(&self, id: &str) -> AppResult<Equipment> {
        self.repository.fetch(id).await
    }

    pub async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment> {
        data.validate()?;
        let now = Utc::now();
        let equipment = Equipment {
            id: data.id.trim().to_string(),
            name: data.name.trim().to_string(),
            kind: data.kind.clone(),
            active: true,
            notes: data.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        self.repository.insert(&equipment).await?;
        tracing::info!(equipment_id = %equipment.id, "Equipment created");
        Ok(equipment)
    }

    pub async fn update(&self, id: &str, data: &UpdateEquipment) -> AppResult<Equipment> {
        data.validate()?;
        let mut equipment: Equipment = self.repository.fetch(id).await?;
        if let Some(ref name) = data.name {
            equipment.name = name.trim().to_string();
        }
        if data.kind.is_some() {
            equipment.kind = data.kind.clone();
        }
        if data.notes.is_some() {
            equipment.notes = data.notes.clone();
        }
        if let Some(active) = data.active {
            equipment.active = active;
        }
        equipment.updated_at = Utc::now();
        self.repository.put(&equipment).await?;
        Ok(equipment)
    }

    /// Take a unit out of service
    pub async fn deactivate(&self, id: &str) -> AppResult<Equipment> {
        let mut equipment: Equipment = self.repository.fetch(id).await?;
        equipment.active = false;
        equipment.updated_at = Utc::now();
        self.repository.put(&equipment).await?;
        tracing::info!(equipment_id = %id, "Equipment deactivated");
        Ok(equipment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[tokio::test]
    async fn test_update_keeps_unset_fields() {
        let service = EquipmentService::new(Repository::in_memory());
        service
            .create(&CreateEquipment {
                id: "EXC-01".to_string(),
                name: "Excavator".to_string(),
                kind: Some("excavator".to_string()),
                notes: None,
            })
            .await
            .unwrap();

        let updated = service
            .update(
                "EXC-01",
                &UpdateEquipment { name: None, kind: None, active: None, notes: Some("Serviced".to_string()) },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Excavator");
        assert_eq!(updated.kind.as_deref(), Some("excavator"));
        assert_eq!(updated.notes.as_deref(), Some("Serviced"));
    }

    #[tokio::test]
    async fn test_missing_equipment_is_not_found() {
        let service = EquipmentService::new(Repository::in_memory());
        assert!(matches!(service.get("NOPE").await, Err(AppError::NotFound(_))));
    }
}
