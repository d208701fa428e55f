use sqlx::PgPool;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookId, GenreRating, RatedBook, Rating, Review, UserId},
};

const UNIQUE_REVIEW_CONSTRAINT: &str = "unique_user_book_review";
const REVIEW_BOOK_FK_CONSTRAINT: &str = "reviews_book_id_fkey";

/// Persistence for the book catalog and the per-user reviews attached to it.
///
/// Every method runs against its own pooled connection. Review writes are
/// transactional: the existence checks and the mutation commit together or
/// not at all.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LibraryStore: Send + Sync {
    /// Every book, annotated with `user_id`'s rating where one exists.
    async fn list_books(&self, user_id: UserId) -> AppResult<Vec<RatedBook>>;

    /// Books whose genre equals `genre` exactly, annotated like `list_books`.
    ///
    /// An absent genre matches nothing.
    async fn books_by_genre(
        &self,
        user_id: UserId,
        genre: Option<String>,
    ) -> AppResult<Vec<RatedBook>>;

    /// Inserts a review. Fails with `NotFound` for an unknown book and
    /// `Conflict` when the user already reviewed it.
    async fn add_review(&self, user_id: UserId, book_id: BookId, rating: Rating)
        -> AppResult<Review>;

    /// Replaces the rating of an existing review. Fails with `NotFound` when
    /// the user has no review for the book.
    async fn update_review(
        &self,
        user_id: UserId,
        book_id: BookId,
        rating: Rating,
    ) -> AppResult<Review>;

    /// Removes the user's review of a book, returning how many rows went away.
    async fn delete_review(&self, user_id: UserId, book_id: BookId) -> AppResult<u64>;

    /// Per-genre rating totals over everything the user reviewed.
    async fn genre_ratings(&self, user_id: UserId) -> AppResult<Vec<GenreRating>>;

    async fn books_in_genre(&self, genre: &str) -> AppResult<Vec<Book>>;

    /// Round trip to the backing database.
    async fn ping(&self) -> AppResult<()>;
}

/// `LibraryStore` backed by PostgreSQL
#[derive(Clone)]
pub struct PgLibraryStore {
    pool: PgPool,
}

impl PgLibraryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl LibraryStore for PgLibraryStore {
    async fn list_books(&self, user_id: UserId) -> AppResult<Vec<RatedBook>> {
        let books = sqlx::query_as::<_, RatedBook>(
            r#"
            SELECT books.id, books.title, books.author, books.genre, reviews.rating
            FROM books
            LEFT JOIN reviews
                ON books.id = reviews.book_id AND reviews.user_id = $1
            ORDER BY books.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(user_id = %user_id, count = books.len(), "Listed books");

        Ok(books)
    }

    async fn books_by_genre(
        &self,
        user_id: UserId,
        genre: Option<String>,
    ) -> AppResult<Vec<RatedBook>> {
        // A NULL genre compares unknown against every row, so nothing matches
        let books = sqlx::query_as::<_, RatedBook>(
            r#"
            SELECT books.id, books.title, books.author, books.genre, reviews.rating
            FROM books
            LEFT JOIN reviews
                ON books.id = reviews.book_id AND reviews.user_id = $1
            WHERE books.genre = $2
            ORDER BY books.id
            "#,
        )
        .bind(user_id)
        .bind(genre.as_deref())
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(
            user_id = %user_id,
            genre = ?genre,
            count = books.len(),
            "Filtered books by genre"
        );

        Ok(books)
    }

    async fn add_review(
        &self,
        user_id: UserId,
        book_id: BookId,
        rating: Rating,
    ) -> AppResult<Review> {
        let mut tx = self.pool.begin().await?;

        let book: Option<i32> = sqlx::query_scalar("SELECT id FROM books WHERE id = $1")
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?;
        if book.is_none() {
            return Err(AppError::NotFound("Wrong book_id".to_string()));
        }

        let existing: Option<i32> =
            sqlx::query_scalar("SELECT id FROM reviews WHERE book_id = $1 AND user_id = $2")
                .bind(book_id)
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;
        if existing.is_some() {
            return Err(duplicate_review());
        }

        // A concurrent insert that committed after the check above lands on
        // the unique constraint and yields no row here.
        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (user_id, book_id, rating)
            VALUES ($1, $2, $3)
            ON CONFLICT ON CONSTRAINT unique_user_book_review DO NOTHING
            RETURNING id, book_id, user_id, rating
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(rating.get())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_review_write_error)?
        .ok_or_else(duplicate_review)?;

        tx.commit().await?;

        Ok(review)
    }

    async fn update_review(
        &self,
        user_id: UserId,
        book_id: BookId,
        rating: Rating,
    ) -> AppResult<Review> {
        let mut tx = self.pool.begin().await?;

        let review = sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews
            SET rating = $1
            WHERE user_id = $2 AND book_id = $3
            RETURNING id, book_id, user_id, rating
            "#,
        )
        .bind(rating.get())
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Review does not exist".to_string()))?;

        tx.commit().await?;

        Ok(review)
    }

    async fn delete_review(&self, user_id: UserId, book_id: BookId) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM reviews WHERE user_id = $1 AND book_id = $2")
            .bind(user_id)
            .bind(book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected())
    }

    async fn genre_ratings(&self, user_id: UserId) -> AppResult<Vec<GenreRating>> {
        let ratings = sqlx::query_as::<_, GenreRating>(
            r#"
            SELECT books.genre AS genre,
                   SUM(reviews.rating)::BIGINT AS rating_sum,
                   COUNT(*) AS review_count
            FROM reviews
            JOIN books ON reviews.book_id = books.id
            WHERE reviews.user_id = $1
            GROUP BY books.genre
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ratings)
    }

    async fn books_in_genre(&self, genre: &str) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT id, title, author, genre FROM books WHERE genre = $1 ORDER BY id",
        )
        .bind(genre)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn duplicate_review() -> AppError {
    AppError::Conflict("Rating already exists".to_string())
}

/// Translates constraint violations on `reviews` into client errors.
fn map_review_write_error(err: sqlx::Error) -> AppError {
    let constraint = err
        .as_database_error()
        .and_then(|db_err| db_err.constraint())
        .map(str::to_owned);

    match constraint.as_deref() {
        Some(UNIQUE_REVIEW_CONSTRAINT) => duplicate_review(),
        Some(REVIEW_BOOK_FK_CONSTRAINT) => AppError::NotFound("Wrong book_id".to_string()),
        _ => AppError::Database(err),
    }
}
