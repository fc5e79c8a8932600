use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::repos::{
    BooksRepo, BooksWriteRepo, CreateBookParams, RecordRatingParams, RepoError, UpdateBookParams,
};
use crate::domain::books::{BookDraft, validate_user_id};
use crate::domain::entities::BookRecord;
use crate::domain::error::DomainError;
use crate::domain::rating::Rating;

#[derive(Debug, Error)]
pub enum BookError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("book not found")]
    NotFound,
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for BookError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => BookError::NotFound,
            other => BookError::Repo(other),
        }
    }
}

/// Catalog operations. Writes never touch the weekly recommendations cache.
#[derive(Clone)]
pub struct BookService {
    reader: Arc<dyn BooksRepo>,
    writer: Arc<dyn BooksWriteRepo>,
}

impl BookService {
    pub fn new(reader: Arc<dyn BooksRepo>, writer: Arc<dyn BooksWriteRepo>) -> Self {
        Self { reader, writer }
    }

    pub async fn list_books(&self) -> Result<Vec<BookRecord>, BookError> {
        self.reader.list_books().await.map_err(BookError::from)
    }

    pub async fn get_book(&self, id: i64) -> Result<BookRecord, BookError> {
        self.reader.find_book(id).await?.ok_or(BookError::NotFound)
    }

    pub async fn create_book(&self, draft: BookDraft) -> Result<BookRecord, BookError> {
        let BookDraft {
            title,
            author,
            genre,
            description,
            image_url,
        } = draft.normalize()?;

        let book = self
            .writer
            .create_book(CreateBookParams {
                title,
                author,
                genre,
                description,
                image_url,
            })
            .await?;

        info!(
            target = "lectern::application::books",
            book_id = book.id,
            "Book created"
        );
        Ok(book)
    }

    pub async fn update_book(&self, id: i64, draft: BookDraft) -> Result<BookRecord, BookError> {
        let BookDraft {
            title,
            author,
            genre,
            description,
            image_url,
        } = draft.normalize()?;

        self.writer
            .update_book(UpdateBookParams {
                id,
                title,
                author,
                genre,
                description,
                image_url,
            })
            .await?
            .ok_or(BookError::NotFound)
    }

    pub async fn delete_book(&self, id: i64) -> Result<(), BookError> {
        if !self.writer.delete_book(id).await? {
            return Err(BookError::NotFound);
        }
        info!(
            target = "lectern::application::books",
            book_id = id,
            "Book deleted"
        );
        Ok(())
    }

    /// Record `user_id`'s rating. Invalid input leaves the book untouched.
    pub async fn rate_book(
        &self,
        id: i64,
        user_id: &str,
        rating: f64,
    ) -> Result<BookRecord, BookError> {
        let rating = Rating::new(rating)?;
        let user_id = validate_user_id(user_id)?;

        let book = self
            .writer
            .record_rating(RecordRatingParams {
                book_id: id,
                user_id: user_id.to_string(),
                rating: rating.value(),
            })
            .await?
            .ok_or(BookError::NotFound)?;

        info!(
            target = "lectern::application::books",
            book_id = book.id,
            average_rating = book.average_rating,
            total_ratings = book.total_ratings,
            "Rating recorded"
        );
        Ok(book)
    }

    pub async fn toggle_favorite(&self, id: i64, user_id: &str) -> Result<BookRecord, BookError> {
        let user_id = validate_user_id(user_id)?;
        self.writer
            .toggle_favorite(id, user_id)
            .await?
            .ok_or(BookError::NotFound)
    }

    pub async fn toggle_cart(&self, id: i64, user_id: &str) -> Result<BookRecord, BookError> {
        let user_id = validate_user_id(user_id)?;
        self.writer
            .toggle_cart(id, user_id)
            .await?
            .ok_or(BookError::NotFound)
    }

    pub async fn cart_for_user(&self, user_id: &str) -> Result<Vec<BookRecord>, BookError> {
        let user_id = validate_user_id(user_id)?;
        self.reader
            .list_in_cart(user_id)
            .await
            .map_err(BookError::from)
    }

    pub async fn health_check(&self) -> Result<(), BookError> {
        self.reader.health_check().await.map_err(BookError::from)
    }
}
