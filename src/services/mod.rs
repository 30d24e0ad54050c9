//! Business logic services

pub mod auth;
pub mod catalog;
pub mod email;
pub mod loans;
pub mod policy;
pub mod reservations;
pub mod settings;

use std::sync::Arc;

use crate::{
    config::{AuthConfig, EmailConfig},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub reservations: reservations::ReservationsService,
    pub settings: settings::SettingsService,
    pub email: email::EmailService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig, email_config: EmailConfig) -> Self {
        let email = email::EmailService::new(email_config);
        let policy: Arc<dyn policy::LoanPolicy> =
            Arc::new(policy::DbLoanPolicy::new(repository.system_config.clone()));

        Self {
            auth: auth::AuthService::new(repository.clone(), auth_config),
            catalog: catalog::CatalogService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone(), policy, email.clone()),
            reservations: reservations::ReservationsService::new(repository.clone()),
            settings: settings::SettingsService::new(repository),
            email,
        }
    }
}
