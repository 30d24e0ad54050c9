//! Reservations repository: one FIFO queue per book

use sqlx::{Pool, Postgres};

use crate::{
    error::{is_unique_violation, AppError, AppResult},
    models::reservation::{Reservation, ReservationStatus},
};

const ENQUEUE_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct ReservationsRepository {
    pool: Pool<Postgres>,
}

impl ReservationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get reservation by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation with id {} not found", id)))
    }

    /// Active queue for a book, head first
    pub async fn queue_for_book(&self, book_id: i32) -> AppResult<Vec<Reservation>> {
        let queue = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT * FROM reservations
            WHERE book_id = $1 AND status = 'ACTIVE'
            ORDER BY position ASC
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(queue)
    }

    /// Append a reservation at the tail of the book's queue.
    ///
    /// Position is assigned in the INSERT itself (max active position + 1,
    /// or 1 for an empty queue). Two concurrent appends can compute the
    /// same position; the partial-unique index turns the loser into a
    /// unique violation, which is retried.
    pub async fn enqueue(&self, user_id: i32, book_id: i32) -> AppResult<Reservation> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let result = sqlx::query_as::<_, Reservation>(
                r#"
                INSERT INTO reservations (user_id, book_id, position, status)
                SELECT $1, $2, COALESCE(MAX(position), 0) + 1, 'ACTIVE'
                FROM reservations
                WHERE book_id = $2 AND status = 'ACTIVE'
                RETURNING *
                "#,
            )
            .bind(user_id)
            .bind(book_id)
            .fetch_one(&self.pool)
            .await;

            match result {
                Ok(reservation) => return Ok(reservation),
                Err(e) if is_unique_violation(&e) && attempts < ENQUEUE_ATTEMPTS => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Cancel an active reservation. Later entries keep their positions.
    pub async fn cancel(&self, id: i32) -> AppResult<Reservation> {
        let reservation = self.get_by_id(id).await?;
        if reservation.status != ReservationStatus::Active {
            return Err(AppError::Conflict(
                "Reservation is no longer active".to_string(),
            ));
        }

        let cancelled = sqlx::query_as::<_, Reservation>(
            r#"
            UPDATE reservations SET status = 'CANCELLED'
            WHERE id = $1 AND status = 'ACTIVE'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Conflict("Reservation is no longer active".to_string()))?;

        Ok(cancelled)
    }
}
