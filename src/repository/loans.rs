//! Loans repository: the loan state machine and the return transaction

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{postgres::PgRow, FromRow, Pool, Postgres, Row};

use crate::{
    dates,
    error::{is_unique_violation, AppError, AppResult},
    models::{
        book::BookSummary,
        loan::{Loan, LoanDetails, LoanStatus},
        reservation::Reservation,
        user::UserSummary,
    },
    repository::books::BooksRepository,
};

/// Loan row joined with its book and user for display
const DETAILS_SELECT: &str = r#"
    SELECT l.*,
           b.isbn AS book_isbn, b.title AS book_title, b.author AS book_author,
           b.cover_image AS book_cover_image,
           u.name AS user_name, u.email AS user_email
    FROM loans l
    JOIN books b ON l.book_id = b.id
    JOIN users u ON l.user_id = u.id
"#;

fn details_from_row(row: &PgRow) -> Result<LoanDetails, sqlx::Error> {
    let loan = Loan::from_row(row)?;
    let now = Utc::now();
    Ok(LoanDetails {
        id: loan.id,
        status: loan.effective_status(now),
        loan_date: loan.loan_date,
        due_date: loan.due_date,
        return_date: loan.return_date,
        renewal_count: loan.renewal_count,
        fine_amount: loan.fine_amount,
        notes: loan.notes.clone(),
        is_overdue: loan.is_logically_overdue(now),
        book: BookSummary {
            id: loan.book_id,
            isbn: row.try_get("book_isbn")?,
            title: row.try_get("book_title")?,
            author: row.try_get("book_author")?,
            cover_image: row.try_get("book_cover_image")?,
        },
        user: UserSummary {
            id: loan.user_id,
            name: row.try_get("user_name")?,
            email: row.try_get("user_email")?,
        },
    })
}

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Get loan with book and user embedded
    pub async fn get_details(&self, id: i32) -> AppResult<LoanDetails> {
        let row = sqlx::query(&format!("{} WHERE l.id = $1", DETAILS_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))?;
        Ok(details_from_row(&row)?)
    }

    /// All loans, newest first
    pub async fn list(&self) -> AppResult<Vec<LoanDetails>> {
        let rows = sqlx::query(&format!("{} ORDER BY l.created_at DESC", DETAILS_SELECT))
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| details_from_row(row).map_err(AppError::from))
            .collect()
    }

    /// Loans for one user, newest first
    pub async fn get_user_loans(&self, user_id: i32) -> AppResult<Vec<LoanDetails>> {
        let rows = sqlx::query(&format!(
            "{} WHERE l.user_id = $1 ORDER BY l.created_at DESC",
            DETAILS_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| details_from_row(row).map_err(AppError::from))
            .collect()
    }

    /// Loans carrying a fine
    pub async fn list_fines(&self) -> AppResult<Vec<LoanDetails>> {
        let rows = sqlx::query(&format!(
            "{} WHERE l.fine_amount > 0 ORDER BY l.fine_amount DESC",
            DETAILS_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| details_from_row(row).map_err(AppError::from))
            .collect()
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Create a loan request for `user_id` on `book_id`.
    ///
    /// The availability check and decrement are one conditional statement,
    /// so concurrent requests cannot double-allocate the last copy. If the
    /// insert afterwards fails, the claimed copy is handed back before the
    /// error surfaces.
    pub async fn create(
        &self,
        user_id: i32,
        book_id: i32,
        loan_period_days: i64,
    ) -> AppResult<LoanDetails> {
        let book_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(book_id)
            .fetch_one(&self.pool)
            .await?;
        if !book_exists {
            return Err(AppError::NotFound(format!(
                "Book with id {} not found",
                book_id
            )));
        }

        let already_borrowing: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM loans
                WHERE user_id = $1 AND book_id = $2 AND status IN ('PENDING', 'ACTIVE')
            )
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        if already_borrowing {
            return Err(AppError::Conflict(
                "You already have an active loan for this book".to_string(),
            ));
        }

        let overdue_loans: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE user_id = $1 AND status = 'OVERDUE'")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        if overdue_loans > 0 {
            return Err(AppError::Forbidden(
                "You have overdue loans; settle them before borrowing again".to_string(),
            ));
        }

        BooksRepository::reserve_copy_on(&self.pool, book_id).await?;

        let now = Utc::now();
        let due_date = dates::add_days(now, loan_period_days);
        let inserted = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO loans (user_id, book_id, status, loan_date, due_date)
            VALUES ($1, $2, 'PENDING', $3, $4)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(now)
        .bind(due_date)
        .fetch_one(&self.pool)
        .await;

        let loan_id = match inserted {
            Ok(id) => id,
            Err(e) => {
                if let Err(release_err) =
                    BooksRepository::release_copy_on(&self.pool, book_id).await
                {
                    tracing::error!(
                        "Failed to release copy of book {} after loan insert error: {}",
                        book_id,
                        release_err
                    );
                }
                if is_unique_violation(&e) {
                    return Err(AppError::Conflict(
                        "You already have an active loan for this book".to_string(),
                    ));
                }
                return Err(e.into());
            }
        };

        self.get_details(loan_id).await
    }

    /// Plain status/notes update for every transition except RETURNED,
    /// which must go through [`Self::return_loan`].
    pub async fn update_status(
        &self,
        loan_id: i32,
        new_status: LoanStatus,
        notes: Option<&str>,
    ) -> AppResult<LoanDetails> {
        self.get_by_id(loan_id).await?;

        sqlx::query("UPDATE loans SET status = $2, notes = COALESCE($3, notes) WHERE id = $1")
            .bind(loan_id)
            .bind(new_status)
            .bind(notes)
            .execute(&self.pool)
            .await?;

        self.get_details(loan_id).await
    }

    /// Close a loan and reallocate its copy, atomically.
    ///
    /// One transaction covers the loan update, the queue-head lookup and
    /// either the restock or the promotion, so a failure at any step leaves
    /// the loan exactly as it was.
    pub async fn return_loan(
        &self,
        loan_id: i32,
        fine_per_day: Decimal,
        notes: Option<&str>,
    ) -> AppResult<LoanDetails> {
        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;

        if loan.return_date.is_some() {
            return Err(AppError::Conflict("Loan already returned".to_string()));
        }

        let now = Utc::now();
        let fine = dates::calculate_fine(loan.due_date, Some(now), fine_per_day);

        sqlx::query(
            r#"
            UPDATE loans SET
                status = 'RETURNED',
                return_date = $2,
                fine_amount = $3,
                notes = COALESCE($4, notes)
            WHERE id = $1
            "#,
        )
        .bind(loan_id)
        .bind(now)
        .bind(fine)
        .bind(notes)
        .execute(&mut *tx)
        .await?;

        let head = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT * FROM reservations
            WHERE book_id = $1 AND status = 'ACTIVE'
            ORDER BY position ASC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(loan.book_id)
        .fetch_optional(&mut *tx)
        .await?;

        match head {
            None => {
                BooksRepository::release_copy_on(&mut *tx, loan.book_id).await?;
            }
            Some(reservation) => {
                // The freed copy transfers straight to the reservation
                // holder; available_qty is untouched.
                let due_date = dates::calculate_due_date(now);
                let new_loan_id = sqlx::query_scalar::<_, i32>(
                    r#"
                    INSERT INTO loans (user_id, book_id, status, loan_date, due_date)
                    VALUES ($1, $2, 'ACTIVE', $3, $4)
                    RETURNING id
                    "#,
                )
                .bind(reservation.user_id)
                .bind(loan.book_id)
                .bind(now)
                .bind(due_date)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        AppError::Conflict(
                            "Reservation holder already has an active loan for this book"
                                .to_string(),
                        )
                    } else {
                        AppError::from(e)
                    }
                })?;

                sqlx::query(
                    r#"
                    UPDATE reservations
                    SET status = 'FULFILLED', fulfilled_at = $2, loan_id = $3
                    WHERE id = $1
                    "#,
                )
                .bind(reservation.id)
                .bind(now)
                .bind(new_loan_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        self.get_details(loan_id).await
    }

    /// Renew a loan, extending the due date by the fixed period.
    pub async fn renew(
        &self,
        loan_id: i32,
        requesting_user_id: i32,
        max_renewals: i32,
    ) -> AppResult<LoanDetails> {
        let loan = self.get_by_id(loan_id).await?;

        if loan.user_id != requesting_user_id {
            return Err(AppError::Forbidden(
                "You can only renew your own loans".to_string(),
            ));
        }

        if let Some(reason) = loan.renewal_denial(Utc::now(), max_renewals) {
            return Err(AppError::Conflict(reason.to_string()));
        }

        sqlx::query("UPDATE loans SET due_date = $2, renewal_count = renewal_count + 1 WHERE id = $1")
            .bind(loan_id)
            .bind(dates::add_days(loan.due_date, dates::FIXED_LOAN_PERIOD_DAYS))
            .execute(&self.pool)
            .await?;

        self.get_details(loan_id).await
    }

    /// Mark every unreturned loan past its due date OVERDUE and refresh its
    /// fine. Idempotent for a given day; fines grow as days pass.
    pub async fn sweep_overdue(&self, fine_per_day: Decimal) -> AppResult<u64> {
        let late = sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM loans
            WHERE return_date IS NULL
              AND due_date < NOW()
              AND status IN ('ACTIVE', 'OVERDUE')
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut swept = 0u64;
        for loan in late {
            let fine = dates::calculate_fine(loan.due_date, None, fine_per_day);
            sqlx::query("UPDATE loans SET status = 'OVERDUE', fine_amount = $2 WHERE id = $1")
                .bind(loan.id)
                .bind(fine)
                .execute(&self.pool)
                .await?;
            swept += 1;
        }
        Ok(swept)
    }

    /// Administrative hard delete. Loans are otherwise append-only history.
    pub async fn delete(&self, loan_id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM loans WHERE id = $1")
            .bind(loan_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Loan with id {} not found",
                loan_id
            )));
        }
        Ok(())
    }
}
