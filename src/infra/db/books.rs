use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use sqlx::types::Json;
use time::OffsetDateTime;

use crate::{
    application::repos::{
        BooksRepo, BooksWriteRepo, CreateBookParams, RecordRatingParams, RepoError,
        UpdateBookParams,
    },
    domain::entities::{BookRecord, BookSummary},
};

use super::{PostgresRepositories, map_sqlx_error};

const BOOK_COLUMNS: &str = "id, title, author, genre, description, image_url, average_rating, \
    total_ratings, user_ratings, favorites, cart, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct BookRow {
    id: i64,
    title: String,
    author: String,
    genre: String,
    description: Option<String>,
    image_url: String,
    average_rating: f64,
    total_ratings: i64,
    user_ratings: Json<BTreeMap<String, f64>>,
    favorites: Json<Vec<String>>,
    cart: Json<Vec<String>>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<BookRow> for BookRecord {
    fn from(row: BookRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            author: row.author,
            genre: row.genre,
            description: row.description,
            image_url: row.image_url,
            average_rating: row.average_rating,
            total_ratings: row.total_ratings,
            user_ratings: row.user_ratings.0,
            favorites: row.favorites.0.into_iter().collect::<BTreeSet<_>>(),
            cart: row.cart.0.into_iter().collect::<BTreeSet<_>>(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    id: i64,
    title: String,
    author: String,
    rating: f64,
    total_ratings: i64,
}

impl From<SummaryRow> for BookSummary {
    fn from(row: SummaryRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            author: row.author,
            rating: row.rating,
            total_ratings: row.total_ratings,
        }
    }
}

#[async_trait]
impl BooksRepo for PostgresRepositories {
    async fn list_books(&self) -> Result<Vec<BookRecord>, RepoError> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY id");
        let rows = sqlx::query_as::<_, BookRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(BookRecord::from).collect())
    }

    async fn find_book(&self, id: i64) -> Result<Option<BookRecord>, RepoError> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = $1");
        let row = sqlx::query_as::<_, BookRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(BookRecord::from))
    }

    async fn top_rated(&self, limit: u32) -> Result<Vec<BookSummary>, RepoError> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT id, title, author, average_rating AS rating, total_ratings
            FROM books
            WHERE total_ratings > 0
            ORDER BY average_rating DESC, id ASC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(BookSummary::from).collect())
    }

    async fn list_in_cart(&self, user_id: &str) -> Result<Vec<BookRecord>, RepoError> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE cart ? $1::text ORDER BY id");
        let rows = sqlx::query_as::<_, BookRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(BookRecord::from).collect())
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        self.ping().await.map_err(map_sqlx_error)
    }
}

#[async_trait]
impl BooksWriteRepo for PostgresRepositories {
    async fn create_book(&self, params: CreateBookParams) -> Result<BookRecord, RepoError> {
        let sql = format!(
            "INSERT INTO books (title, author, genre, description, image_url) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {BOOK_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BookRow>(&sql)
            .bind(params.title)
            .bind(params.author)
            .bind(params.genre)
            .bind(params.description)
            .bind(params.image_url)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(BookRecord::from(row))
    }

    async fn update_book(
        &self,
        params: UpdateBookParams,
    ) -> Result<Option<BookRecord>, RepoError> {
        let sql = format!(
            "UPDATE books \
             SET title = $2, author = $3, genre = $4, description = $5, image_url = $6, \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {BOOK_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BookRow>(&sql)
            .bind(params.id)
            .bind(params.title)
            .bind(params.author)
            .bind(params.genre)
            .bind(params.description)
            .bind(params.image_url)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(BookRecord::from))
    }

    async fn delete_book(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_rating(
        &self,
        params: RecordRatingParams,
    ) -> Result<Option<BookRecord>, RepoError> {
        // Every SET expression sees the pre-update row, so each one merges the
        // new rating itself. The row lock makes the upsert and aggregate atomic.
        let sql = format!(
            "UPDATE books \
             SET user_ratings = user_ratings || jsonb_build_object($2::text, $3::float8), \
                 total_ratings = ( \
                     SELECT COUNT(*) \
                     FROM jsonb_object_keys(user_ratings || jsonb_build_object($2::text, $3::float8)) \
                 ), \
                 average_rating = COALESCE(( \
                     SELECT AVG(value::float8) \
                     FROM jsonb_each_text(user_ratings || jsonb_build_object($2::text, $3::float8)) \
                 ), 0), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {BOOK_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BookRow>(&sql)
            .bind(params.book_id)
            .bind(params.user_id)
            .bind(params.rating)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(BookRecord::from))
    }

    async fn toggle_favorite(
        &self,
        book_id: i64,
        user_id: &str,
    ) -> Result<Option<BookRecord>, RepoError> {
        let sql = format!(
            "UPDATE books \
             SET favorites = CASE \
                     WHEN favorites ? $2::text THEN favorites - $2::text \
                     ELSE favorites || to_jsonb($2::text) \
                 END, \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {BOOK_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BookRow>(&sql)
            .bind(book_id)
            .bind(user_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(BookRecord::from))
    }

    async fn toggle_cart(
        &self,
        book_id: i64,
        user_id: &str,
    ) -> Result<Option<BookRecord>, RepoError> {
        let sql = format!(
            "UPDATE books \
             SET cart = CASE \
                     WHEN cart ? $2::text THEN cart - $2::text \
                     ELSE cart || to_jsonb($2::text) \
                 END, \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {BOOK_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BookRow>(&sql)
            .bind(book_id)
            .bind(user_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(BookRecord::from))
    }
}
