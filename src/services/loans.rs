//! Loan lifecycle service

use std::sync::Arc;

use crate::{
    error::AppResult,
    models::loan::{LoanDetails, LoanStatus},
    repository::Repository,
    services::{email::EmailService, policy::LoanPolicy},
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    policy: Arc<dyn LoanPolicy>,
    email: EmailService,
}

impl LoansService {
    pub fn new(repository: Repository, policy: Arc<dyn LoanPolicy>, email: EmailService) -> Self {
        Self {
            repository,
            policy,
            email,
        }
    }

    /// Create a loan request for a book.
    ///
    /// The confirmation email is fire-and-forget: a delivery failure is
    /// logged and never rolls the loan back.
    pub async fn create_loan(&self, user_id: i32, book_id: i32) -> AppResult<LoanDetails> {
        self.repository.users.get_by_id(user_id).await?;

        let loan_period_days = self.policy.loan_period_days().await?;
        let loan = self
            .repository
            .loans
            .create(user_id, book_id, loan_period_days)
            .await?;

        let email = self.email.clone();
        let confirmation = loan.clone();
        tokio::spawn(async move {
            if let Err(e) = email.send_loan_confirmation(&confirmation).await {
                tracing::warn!("Failed to send loan confirmation email: {}", e);
            }
        });

        Ok(loan)
    }

    /// Transition a loan to a new status. RETURNED triggers the return
    /// transaction (fine, queue head, restock or promotion).
    pub async fn update_loan_status(
        &self,
        loan_id: i32,
        new_status: LoanStatus,
        notes: Option<&str>,
    ) -> AppResult<LoanDetails> {
        if new_status == LoanStatus::Returned {
            let fine_per_day = self.policy.fine_per_day().await?;
            self.repository
                .loans
                .return_loan(loan_id, fine_per_day, notes)
                .await
        } else {
            self.repository
                .loans
                .update_status(loan_id, new_status, notes)
                .await
        }
    }

    /// Renew a loan on behalf of its holder
    pub async fn renew_loan(&self, loan_id: i32, requesting_user_id: i32) -> AppResult<LoanDetails> {
        let max_renewals = self.policy.max_renewals().await?;
        self.repository
            .loans
            .renew(loan_id, requesting_user_id, max_renewals)
            .await
    }

    /// Promote late ACTIVE loans to OVERDUE and refresh fines
    pub async fn run_overdue_sweep(&self) -> AppResult<u64> {
        let fine_per_day = self.policy.fine_per_day().await?;
        let swept = self.repository.loans.sweep_overdue(fine_per_day).await?;
        if swept > 0 {
            tracing::info!("Overdue sweep updated {} loan(s)", swept);
        }
        Ok(swept)
    }

    /// All loans, newest first
    pub async fn list_loans(&self) -> AppResult<Vec<LoanDetails>> {
        self.repository.loans.list().await
    }

    /// Loans for one user
    pub async fn get_user_loans(&self, user_id: i32) -> AppResult<Vec<LoanDetails>> {
        self.repository.users.get_by_id(user_id).await?;
        self.repository.loans.get_user_loans(user_id).await
    }

    /// Loans carrying a fine
    pub async fn list_fines(&self) -> AppResult<Vec<LoanDetails>> {
        self.repository.loans.list_fines().await
    }

    /// Administrative hard delete
    pub async fn delete_loan(&self, loan_id: i32) -> AppResult<()> {
        self.repository.loans.delete(loan_id).await
    }
}
