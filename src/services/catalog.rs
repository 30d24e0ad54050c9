//! Catalog management service

use crate::{
    error::{AppError, AppResult},
    isbn::canonicalize_isbn,
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search books with filters
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.search(query).await
    }

    /// Get book by ID
    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Create a new book. The ISBN is canonicalized first and duplicates
    /// are rejected before the insert.
    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        let isbn = canonicalize_isbn(&book.isbn).ok_or_else(|| {
            AppError::Validation("ISBN must contain exactly 13 digits".to_string())
        })?;

        if let Some(existing) = self.repository.books.find_by_isbn(&isbn).await? {
            return Err(AppError::Conflict(format!(
                "A book with ISBN {} already exists (id={})",
                isbn, existing.id
            )));
        }

        self.repository.books.create(&isbn, &book).await
    }

    /// Update catalog fields of a book
    pub async fn update_book(&self, id: i32, update: UpdateBook) -> AppResult<Book> {
        self.repository.books.update(id, &update).await
    }

    /// Delete a book without pending or active loans
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await
    }
}
