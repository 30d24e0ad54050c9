//! Reservation model and queue types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Reservation states. A reservation is fulfilled exactly once, when a
/// return finds it at the head of its book's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "reservation_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ReservationStatus {
    Active,
    Fulfilled,
    Cancelled,
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ReservationStatus::Active => "ACTIVE",
            ReservationStatus::Fulfilled => "FULFILLED",
            ReservationStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", label)
    }
}

/// Reservation model from database.
///
/// `position` is 1-based and unique among a book's ACTIVE reservations,
/// increasing in creation order; the queue is consumed from the smallest
/// position on return.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub position: i32,
    pub status: ReservationStatus,
    pub fulfilled_at: Option<DateTime<Utc>>,
    pub loan_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}
