//! Business logic services

pub mod assignments;
pub mod email;
pub mod equipment;
pub mod loans;
pub mod notifications;
pub mod operators;
pub mod reports;
pub mod requests;
pub mod tracking;
pub mod users;
pub mod weekly_assignments;

use crate::{config::AppConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub operators: operators::OperatorsService,
    pub equipment: equipment::EquipmentService,
    pub weekly_assignments: weekly_assignments::WeeklyAssignmentsService,
    pub assignments: assignments::AssignmentsService,
    pub loans: loans::LoansService,
    pub requests: requests::RequestsService,
    pub users: users::UsersService,
    pub reports: reports::ReportsService,
    pub notifications: notifications::NotificationsService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> AppResult<Self> {
        let notifications = notifications::NotificationsService::new(
            repository.clone(),
            config.push.clone(),
            config.auth.admin_uids.clone(),
        )?;
        let email = email::EmailService::new(config.email.clone());
        let assignments =
            assignments::AssignmentsService::new(repository.clone(), notifications.clone());

        Ok(Self {
            operators: operators::OperatorsService::new(repository.clone()),
            equipment: equipment::EquipmentService::new(repository.clone()),
            weekly_assignments: weekly_assignments::WeeklyAssignmentsService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone(), notifications.clone()),
            requests: requests::RequestsService::new(
                repository.clone(),
                assignments.clone(),
                notifications.clone(),
            ),
            assignments,
            users: users::UsersService::new(repository.clone(), config.auth.clone()),
            reports: reports::ReportsService::new(repository.clone(), email, config.reports.clone()),
            notifications,
            repository,
        })
    }

    /// Repository shared by the services, for readiness checks and change feeds
    pub fn repository(&self) -> &Repository {
        &self.repository
    }
}
