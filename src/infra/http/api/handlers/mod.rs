//! API handlers organized by resource type.
//!
//! Error conversions shared by the resource modules live here.

mod books;
mod recommendations;

pub use books::*;
pub use recommendations::*;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;

use crate::application::books::BookError;
use crate::application::recommendations::RecommendationError;
use crate::application::repos::RepoError;
use crate::domain::error::DomainError;
use crate::infra::http::db_health_response;

use super::error::{ApiError, codes};
use super::state::ApiState;

pub async fn health(State(state): State<ApiState>) -> Response {
    db_health_response(state.books.health_check().await)
}

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(msg) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(msg),
        ),
    }
}

pub(crate) fn book_to_api(err: BookError) -> ApiError {
    match err {
        BookError::Validation(DomainError::Validation { message }) => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid book request",
            Some(message),
        ),
        BookError::NotFound => ApiError::not_found("book not found"),
        BookError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn recommendation_to_api(err: RecommendationError) -> ApiError {
    match err {
        RecommendationError::Store(repo) => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::STORE_UNAVAILABLE,
            "Book store unavailable",
            Some(repo.to_string()),
        ),
        RecommendationError::Cache(cache) => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::CACHE_UNAVAILABLE,
            "Recommendations cache unavailable",
            Some(cache.to_string()),
        ),
    }
}
