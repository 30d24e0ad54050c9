//! Loan model and lifecycle types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::book::BookSummary;
use super::user::UserSummary;

/// Loan lifecycle states.
///
/// `PENDING → ACTIVE → {RETURNED, OVERDUE}`; any non-terminal state can be
/// cancelled administratively. `Overdue` is written by the sweep; readers
/// must not assume the stored status is live (see [`Loan::effective_status`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "loan_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum LoanStatus {
    Pending,
    Active,
    Returned,
    Overdue,
    Cancelled,
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoanStatus::Pending => "PENDING",
            LoanStatus::Active => "ACTIVE",
            LoanStatus::Returned => "RETURNED",
            LoanStatus::Overdue => "OVERDUE",
            LoanStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", label)
    }
}

/// Loan model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub status: LoanStatus,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub renewal_count: i32,
    pub fine_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Loan {
    /// The loan still holds a copy (counts against availability).
    pub fn is_live(&self) -> bool {
        matches!(self.status, LoanStatus::Pending | LoanStatus::Active)
    }

    /// Past due and never returned, regardless of whether the sweep ran.
    pub fn is_logically_overdue(&self, now: DateTime<Utc>) -> bool {
        self.return_date.is_none()
            && now > self.due_date
            && matches!(self.status, LoanStatus::Active | LoanStatus::Overdue)
    }

    /// Status as a reader should interpret it: an unswept late ACTIVE loan
    /// reads as OVERDUE.
    pub fn effective_status(&self, now: DateTime<Utc>) -> LoanStatus {
        if self.status == LoanStatus::Active && self.is_logically_overdue(now) {
            LoanStatus::Overdue
        } else {
            self.status
        }
    }

    /// Why a renewal must be refused, or `None` when it may proceed.
    pub fn renewal_denial(&self, now: DateTime<Utc>, max_renewals: i32) -> Option<&'static str> {
        if !self.is_live() {
            return Some("Cannot renew a returned loan");
        }
        if now > self.due_date {
            return Some("Cannot renew an overdue loan");
        }
        if self.renewal_count >= max_renewals {
            return Some("Renewal limit reached");
        }
        None
    }
}

/// Loan with book and user embedded, for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanDetails {
    pub id: i32,
    pub status: LoanStatus,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub renewal_count: i32,
    pub fine_amount: Decimal,
    pub notes: Option<String>,
    pub is_overdue: bool,
    pub book: BookSummary,
    pub user: UserSummary,
}
