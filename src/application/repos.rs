//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{BookRecord, BookSummary};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateBookParams {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub description: Option<String>,
    pub image_url: String,
}

#[derive(Debug, Clone)]
pub struct UpdateBookParams {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub description: Option<String>,
    pub image_url: String,
}

#[derive(Debug, Clone)]
pub struct RecordRatingParams {
    pub book_id: i64,
    pub user_id: String,
    /// Already validated to lie in the rating range.
    pub rating: f64,
}

#[async_trait]
pub trait BooksRepo: Send + Sync {
    /// All books, ordered by id.
    async fn list_books(&self) -> Result<Vec<BookRecord>, RepoError>;

    async fn find_book(&self, id: i64) -> Result<Option<BookRecord>, RepoError>;

    /// Rated books ordered by average rating descending, ties broken by id ascending.
    async fn top_rated(&self, limit: u32) -> Result<Vec<BookSummary>, RepoError>;

    /// Books whose cart contains `user_id`, ordered by id.
    async fn list_in_cart(&self, user_id: &str) -> Result<Vec<BookRecord>, RepoError>;

    async fn health_check(&self) -> Result<(), RepoError>;
}

/// Write side. Methods addressing a single book return `None` when it does not exist.
#[async_trait]
pub trait BooksWriteRepo: Send + Sync {
    async fn create_book(&self, params: CreateBookParams) -> Result<BookRecord, RepoError>;

    async fn update_book(&self, params: UpdateBookParams)
    -> Result<Option<BookRecord>, RepoError>;

    /// Returns whether a row was removed.
    async fn delete_book(&self, id: i64) -> Result<bool, RepoError>;

    /// Upsert the user's rating and recompute the aggregate atomically.
    async fn record_rating(
        &self,
        params: RecordRatingParams,
    ) -> Result<Option<BookRecord>, RepoError>;

    async fn toggle_favorite(
        &self,
        book_id: i64,
        user_id: &str,
    ) -> Result<Option<BookRecord>, RepoError>;

    async fn toggle_cart(&self, book_id: i64, user_id: &str)
    -> Result<Option<BookRecord>, RepoError>;
}
