//! Conversions between domain records and the wire types in `lectern-api-types`.

pub use lectern_api_types::{
    BookResponse, BookSummaryResponse, BookWriteRequest, RateBookRequest, RefreshResponse,
    RefreshStatus, SnapshotSource as SnapshotSourceResponse, UserActionRequest,
    WeeklyRecommendationsResponse,
};

use crate::application::recommendations::{
    RefreshOutcome, SnapshotSource, WeeklyRecommendations,
};
use crate::domain::books::BookDraft;
use crate::domain::entities::{BookRecord, BookSummary};

impl From<BookWriteRequest> for BookDraft {
    fn from(request: BookWriteRequest) -> Self {
        Self {
            title: request.title,
            author: request.author,
            genre: request.genre,
            description: request.description,
            image_url: request.image_url,
        }
    }
}

pub fn book_response(record: BookRecord) -> BookResponse {
    BookResponse {
        id: record.id,
        title: record.title,
        author: record.author,
        genre: record.genre,
        description: record.description,
        image_url: record.image_url,
        average_rating: record.average_rating,
        total_ratings: record.total_ratings,
        user_ratings: record.user_ratings,
        favorites: record.favorites.into_iter().collect(),
        cart: record.cart.into_iter().collect(),
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

pub fn summary_response(summary: BookSummary) -> BookSummaryResponse {
    BookSummaryResponse {
        id: summary.id,
        title: summary.title,
        author: summary.author,
        rating: summary.rating,
        total_ratings: summary.total_ratings,
    }
}

pub fn weekly_response(weekly: WeeklyRecommendations) -> WeeklyRecommendationsResponse {
    let source = match weekly.source {
        SnapshotSource::Cache => SnapshotSourceResponse::Cache,
        SnapshotSource::Recomputed => SnapshotSourceResponse::Recomputed,
    };
    WeeklyRecommendationsResponse {
        source,
        books: weekly.books.into_iter().map(summary_response).collect(),
    }
}

pub fn refresh_response(outcome: RefreshOutcome) -> RefreshResponse {
    match outcome {
        RefreshOutcome::Completed { task_id, books } => RefreshResponse {
            status: RefreshStatus::Completed,
            task_id,
            books: Some(books.len()),
        },
        RefreshOutcome::Skipped { task_id } => RefreshResponse {
            status: RefreshStatus::Skipped,
            task_id,
            books: None,
        },
    }
}
