//! Loan policy provider: system tunables behind typed accessors
//!
//! The loan lifecycle never reads `system_config` rows directly; it goes
//! through this trait, which applies the hardcoded fallbacks when a key is
//! absent or unparsable. Tests substitute a mock.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::{error::AppResult, repository::system_config::SystemConfigRepository};

pub const FALLBACK_LOAN_DAYS: i64 = 14;
pub const FALLBACK_MAX_RENEWALS: i32 = 2;

/// 2.50 per day
pub fn fallback_fine_per_day() -> Decimal {
    Decimal::new(250, 2)
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoanPolicy: Send + Sync {
    /// Loan period for direct loan creation (`DEFAULT_LOAN_DAYS`)
    async fn loan_period_days(&self) -> AppResult<i64>;
    /// Daily fine rate (`FINE_PER_DAY`)
    async fn fine_per_day(&self) -> AppResult<Decimal>;
    /// Renewal cap (`MAX_RENEWALS`)
    async fn max_renewals(&self) -> AppResult<i32>;
}

/// Policy backed by the `system_config` table
#[derive(Clone)]
pub struct DbLoanPolicy {
    config: SystemConfigRepository,
}

impl DbLoanPolicy {
    pub fn new(config: SystemConfigRepository) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LoanPolicy for DbLoanPolicy {
    async fn loan_period_days(&self) -> AppResult<i64> {
        Ok(self
            .config
            .get("DEFAULT_LOAN_DAYS")
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or(FALLBACK_LOAN_DAYS))
    }

    async fn fine_per_day(&self) -> AppResult<Decimal> {
        Ok(self
            .config
            .get("FINE_PER_DAY")
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(fallback_fine_per_day))
    }

    async fn max_renewals(&self) -> AppResult<i32> {
        Ok(self
            .config
            .get("MAX_RENEWALS")
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or(FALLBACK_MAX_RENEWALS))
    }
}
