//! Reservation queue service

use crate::{
    error::{AppError, AppResult},
    models::{reservation::Reservation, user::UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct ReservationsService {
    repository: Repository,
}

impl ReservationsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Join the FIFO queue for a book.
    ///
    /// A user may hold several active reservations for the same book; the
    /// queue does not deduplicate.
    pub async fn reserve(&self, user_id: i32, book_id: i32) -> AppResult<Reservation> {
        self.repository.books.get_by_id(book_id).await?;
        self.repository.reservations.enqueue(user_id, book_id).await
    }

    /// Cancel an active reservation (its holder, or staff)
    pub async fn cancel(&self, reservation_id: i32, claims: &UserClaims) -> AppResult<Reservation> {
        let reservation = self.repository.reservations.get_by_id(reservation_id).await?;
        if !claims.role.is_staff() && reservation.user_id != claims.sub {
            return Err(AppError::Forbidden(
                "You can only cancel your own reservations".to_string(),
            ));
        }
        self.repository.reservations.cancel(reservation_id).await
    }

    /// Active queue for a book, head first
    pub async fn queue_for_book(&self, book_id: i32) -> AppResult<Vec<Reservation>> {
        self.repository.books.get_by_id(book_id).await?;
        self.repository.reservations.queue_for_book(book_id).await
    }
}
