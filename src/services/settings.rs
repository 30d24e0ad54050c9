//! Settings service over the system_config store

use crate::{
    api::settings::{SettingsResponse, UpdateSettingsRequest},
    error::AppResult,
    repository::Repository,
    services::policy::{fallback_fine_per_day, FALLBACK_LOAN_DAYS, FALLBACK_MAX_RENEWALS},
};

#[derive(Clone)]
pub struct SettingsService {
    repository: Repository,
}

impl SettingsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Current tunables, with the fallback defaults applied
    pub async fn get_settings(&self) -> AppResult<SettingsResponse> {
        let config = &self.repository.system_config;

        let default_loan_days = config
            .get("DEFAULT_LOAN_DAYS")
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or(FALLBACK_LOAN_DAYS);
        let fine_per_day = config
            .get("FINE_PER_DAY")
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(fallback_fine_per_day);
        let max_renewals = config
            .get("MAX_RENEWALS")
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or(FALLBACK_MAX_RENEWALS);

        Ok(SettingsResponse {
            default_loan_days,
            fine_per_day,
            max_renewals,
        })
    }

    /// Update tunables; omitted fields are left untouched
    pub async fn update_settings(
        &self,
        request: UpdateSettingsRequest,
    ) -> AppResult<SettingsResponse> {
        let config = &self.repository.system_config;

        if let Some(days) = request.default_loan_days {
            config.set("DEFAULT_LOAN_DAYS", &days.to_string()).await?;
        }
        if let Some(rate) = request.fine_per_day {
            config.set("FINE_PER_DAY", &rate.to_string()).await?;
        }
        if let Some(max) = request.max_renewals {
            config.set("MAX_RENEWALS", &max.to_string()).await?;
        }

        self.get_settings().await
    }
}
