//! Wire types for the Lectern HTTP API.
//!
//! Kept free of server dependencies so clients can share them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookWriteRequest {
    pub title: String,
    pub author: String,
    pub genre: String,
    #[serde(default)]
    pub description: Option<String>,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookResponse {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub description: Option<String>,
    pub image_url: String,
    pub average_rating: f64,
    pub total_ratings: i64,
    pub user_ratings: BTreeMap<String, f64>,
    pub favorites: Vec<String>,
    pub cart: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateBookRequest {
    pub user_id: String,
    pub rating: f64,
}

/// Body for the favorite and cart toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserActionRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSummaryResponse {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub rating: f64,
    pub total_ratings: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSource {
    Cache,
    Recomputed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyRecommendationsResponse {
    pub source: SnapshotSource,
    pub books: Vec<BookSummaryResponse>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshStatus {
    Completed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub status: RefreshStatus,
    pub task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub books: Option<usize>,
}
