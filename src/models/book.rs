//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Availability status of a title. `Borrowed` iff no copy is free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "book_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum BookStatus {
    Available,
    Borrowed,
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookStatus::Available => write!(f, "AVAILABLE"),
            BookStatus::Borrowed => write!(f, "BORROWED"),
        }
    }
}

/// Book model from database.
///
/// `quantity` counts copies owned, `available_qty` copies not currently on
/// loan. Both are mutated only through the inventory operations in the
/// books repository, never by plain catalog edits.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i32,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub category: String,
    pub publisher: Option<String>,
    pub publish_year: Option<i32>,
    pub pages: Option<i32>,
    pub language: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub cover_image: Option<String>,
    pub quantity: i32,
    pub available_qty: i32,
    pub status: BookStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short book representation embedded in loan and reservation payloads
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub id: i32,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub cover_image: Option<String>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    #[validate(length(min = 10, max = 20))]
    pub isbn: String,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1, max = 255))]
    pub author: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    pub publisher: Option<String>,
    pub publish_year: Option<i32>,
    pub pages: Option<i32>,
    pub language: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub cover_image: Option<String>,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

/// Update book request. `quantity` changes are reconciled into
/// `available_qty` by the repository; the other inventory fields cannot be
/// set directly.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub author: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    pub publisher: Option<String>,
    pub publish_year: Option<i32>,
    pub pages: Option<i32>,
    pub language: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub cover_image: Option<String>,
    #[validate(range(min = 0))]
    pub quantity: Option<i32>,
}

/// Book query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Matches title, author or ISBN (case-insensitive substring)
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<BookStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
