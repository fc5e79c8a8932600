//! Domain entities mirrored from persistent storage.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookRecord {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub description: Option<String>,
    pub image_url: String,
    pub average_rating: f64,
    pub total_ratings: i64,
    /// Latest rating per user id.
    pub user_ratings: BTreeMap<String, f64>,
    pub favorites: BTreeSet<String>,
    /// Users that currently hold the book in their cart.
    pub cart: BTreeSet<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl BookRecord {
    pub fn summary(&self) -> BookSummary {
        BookSummary {
            id: self.id,
            title: self.title.clone(),
            author: self.author.clone(),
            rating: self.average_rating,
            total_ratings: self.total_ratings,
        }
    }
}

/// One entry of the weekly recommendations snapshot.
///
/// This is the cached payload shape, so field names are part of the cache format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSummary {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub rating: f64,
    pub total_ratings: i64,
}
