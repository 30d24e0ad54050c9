//! Books repository: catalog persistence and the copy-count ledger

use sqlx::{PgExecutor, Pool, Postgres};

use crate::{
    error::{is_unique_violation, AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Get book by canonical ISBN
    pub async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE isbn = $1")
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    /// Search books with filters and pagination
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(10).clamp(1, 100);

        let filter = r#"
            ($1::text IS NULL
                OR title ILIKE '%' || $1 || '%'
                OR author ILIKE '%' || $1 || '%'
                OR isbn ILIKE '%' || $1 || '%')
            AND ($2::text IS NULL OR category = $2)
            AND ($3::book_status IS NULL OR status = $3)
        "#;

        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT * FROM books WHERE {} ORDER BY title LIMIT $4 OFFSET $5",
            filter
        ))
        .bind(&query.search)
        .bind(&query.category)
        .bind(query.status)
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM books WHERE {}", filter))
                .bind(&query.search)
                .bind(&query.category)
                .bind(query.status)
                .fetch_one(&self.pool)
                .await?;

        Ok((books, total))
    }

    // =========================================================================
    // WRITE
    // =========================================================================

    /// Insert a new book. `isbn` must already be canonical; every copy
    /// starts available.
    pub async fn create(&self, isbn: &str, book: &CreateBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (
                isbn, title, author, category, publisher, publish_year, pages,
                language, description, location, cover_image,
                quantity, available_qty, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12, 'AVAILABLE')
            RETURNING *
            "#,
        )
        .bind(isbn)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.category)
        .bind(&book.publisher)
        .bind(book.publish_year)
        .bind(book.pages)
        .bind(&book.language)
        .bind(&book.description)
        .bind(&book.location)
        .bind(&book.cover_image)
        .bind(book.quantity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("A book with ISBN {} already exists", isbn))
            } else {
                e.into()
            }
        })
    }

    /// Update catalog fields. A `quantity` change shifts `available_qty` by
    /// the same delta and is refused when it would drop below the copies
    /// currently on loan.
    pub async fn update(&self, id: i32, update: &UpdateBook) -> AppResult<Book> {
        self.get_by_id(id).await?;

        let mut book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                title = COALESCE($2, title),
                author = COALESCE($3, author),
                category = COALESCE($4, category),
                publisher = COALESCE($5, publisher),
                publish_year = COALESCE($6, publish_year),
                pages = COALESCE($7, pages),
                language = COALESCE($8, language),
                description = COALESCE($9, description),
                location = COALESCE($10, location),
                cover_image = COALESCE($11, cover_image),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.author)
        .bind(&update.category)
        .bind(&update.publisher)
        .bind(update.publish_year)
        .bind(update.pages)
        .bind(&update.language)
        .bind(&update.description)
        .bind(&update.location)
        .bind(&update.cover_image)
        .fetch_one(&self.pool)
        .await?;

        if let Some(quantity) = update.quantity {
            book = sqlx::query_as::<_, Book>(
                r#"
                UPDATE books SET
                    quantity = $2,
                    available_qty = available_qty + ($2 - quantity),
                    status = CASE
                        WHEN available_qty + ($2 - quantity) = 0 THEN 'BORROWED'::book_status
                        ELSE 'AVAILABLE'::book_status
                    END,
                    updated_at = NOW()
                WHERE id = $1 AND available_qty + ($2 - quantity) >= 0
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(quantity)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(
                    "Cannot reduce quantity below the number of copies on loan".to_string(),
                )
            })?;
        }

        Ok(book)
    }

    /// Delete a book. Refused while any PENDING or ACTIVE loan references it.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.get_by_id(id).await?;

        let result = sqlx::query(
            r#"
            DELETE FROM books
            WHERE id = $1
              AND NOT EXISTS (
                  SELECT 1 FROM loans
                  WHERE book_id = $1 AND status IN ('PENDING', 'ACTIVE')
              )
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "Book has pending or active loans and cannot be deleted".to_string(),
            ));
        }
        Ok(())
    }

    // =========================================================================
    // INVENTORY LEDGER
    // =========================================================================

    /// Claim one free copy: a single conditional decrement, so two
    /// concurrent claims can never both succeed on the last copy. Zero rows
    /// means nothing was free.
    pub async fn reserve_copy(&self, book_id: i32) -> AppResult<()> {
        Self::reserve_copy_on(&self.pool, book_id).await
    }

    pub(crate) async fn reserve_copy_on<'e, E>(executor: E, book_id: i32) -> AppResult<()>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE books SET
                available_qty = available_qty - 1,
                status = CASE WHEN available_qty - 1 = 0 THEN 'BORROWED'::book_status ELSE status END,
                updated_at = NOW()
            WHERE id = $1 AND available_qty > 0
            "#,
        )
        .bind(book_id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Unavailable(
                "No copies of this book are currently available".to_string(),
            ));
        }
        Ok(())
    }

    /// Return one copy to general inventory. Called only when no queued
    /// reservation claims the freed copy. The `available_qty < quantity`
    /// guard keeps the count from ever exceeding the copies owned.
    pub async fn release_copy(&self, book_id: i32) -> AppResult<()> {
        Self::release_copy_on(&self.pool, book_id).await
    }

    pub(crate) async fn release_copy_on<'e, E>(executor: E, book_id: i32) -> AppResult<()>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE books SET
                available_qty = available_qty + 1,
                status = 'AVAILABLE',
                updated_at = NOW()
            WHERE id = $1 AND available_qty < quantity
            "#,
        )
        .bind(book_id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Internal(format!(
                "Inventory inconsistency: release_copy for book {} found no copy out",
                book_id
            )));
        }
        Ok(())
    }
}
